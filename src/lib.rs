//! Multi-backend styling core for a virtual wardrobe.
//!
//! Three interchangeable backends sit behind one facade: the developer
//! API (`direct`, geo-restricted), Vertex AI (`proxied`), and an offline
//! deterministic `mock`. On first use the selector constructs and probes
//! the preferred backend and falls back to the mock when it is unusable;
//! the choice is then cached for the life of the process.
//!
//! ```no_run
//! use garb::{Config, Wardrobe};
//!
//! # async fn demo() -> Result<(), garb::GarbError> {
//! let wardrobe = Wardrobe::new(Config::load());
//! let recs = wardrobe.recommend_styles(&[], None).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod closet;
pub mod config;
pub mod error;
pub mod probe;
pub mod prompt;
pub mod selector;
pub mod wardrobe;
pub mod wire;

pub use closet::{
    ClothingItem, Composition, GarmentKind, GarmentSpec, OutfitCritique, StyleFeedback,
    StyleRecommendation,
};
pub use config::{BackendKind, Config};
pub use error::GarbError;
pub use selector::{Selected, Selector};
pub use wardrobe::Wardrobe;
