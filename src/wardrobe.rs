//! The capability facade callers program against. Each operation obtains
//! the process-wide backend selection (running it on first use) and
//! delegates, passing results through untouched apart from the
//! empty-result guard.

use crate::closet::{
    ClothingItem, Composition, GarmentSpec, OutfitCritique, StyleFeedback, StyleRecommendation,
};
use crate::config::{BackendKind, Config};
use crate::error::GarbError;
use crate::selector::Selector;

pub struct Wardrobe {
    selector: Selector,
}

impl Wardrobe {
    pub fn new(config: Config) -> Self {
        Self {
            selector: Selector::new(config),
        }
    }

    /// Configuration from `garb.toml` and the environment.
    pub fn from_env() -> Self {
        Self::new(Config::load())
    }

    /// Bring your own selector (custom factory, pre-seeded config).
    pub fn with_selector(selector: Selector) -> Self {
        Self { selector }
    }

    /// Which backend this process is using. Triggers selection on first
    /// call, like every operation does.
    pub async fn backend(&self) -> Result<BackendKind, GarbError> {
        Ok(self.selector.select().await?.kind)
    }

    /// Composite the given garments onto the subject photo.
    pub async fn try_on(
        &self,
        subject: &str,
        items: &[ClothingItem],
    ) -> Result<Composition, GarbError> {
        let selected = self.selector.select().await?;
        let composition = selected.stylist.try_on(subject, items).await?;
        require_content(composition, selected.stylist.name(), "try_on")
    }

    /// Invent an outfit and render it onto the subject. A result with a
    /// caption but no image is a valid partial success.
    pub async fn design_outfit(&self, subject: &str) -> Result<Composition, GarbError> {
        let selected = self.selector.select().await?;
        let composition = selected.stylist.design_outfit(subject).await?;
        require_content(composition, selected.stylist.name(), "design_outfit")
    }

    /// Outfit recommendations from the closet, steered by prior feedback.
    pub async fn recommend_styles(
        &self,
        closet: &[ClothingItem],
        feedback: Option<&StyleFeedback>,
    ) -> Result<Vec<StyleRecommendation>, GarbError> {
        let selected = self.selector.select().await?;
        selected.stylist.recommend_styles(closet, feedback).await
    }

    /// Synthesize a garment product shot. Returns bare base64 image data.
    pub async fn generate_garment(&self, spec: &GarmentSpec) -> Result<String, GarbError> {
        let selected = self.selector.select().await?;
        let image = selected.stylist.generate_garment(spec).await?;
        if image.is_empty() {
            return Err(GarbError::EmptyResponse {
                provider: selected.stylist.name().to_string(),
                operation: "generate_garment",
            });
        }
        Ok(image)
    }

    /// Score and critique the outfit in the subject photo.
    pub async fn critique_outfit(&self, subject: &str) -> Result<OutfitCritique, GarbError> {
        let selected = self.selector.select().await?;
        selected.stylist.critique_outfit(subject).await
    }
}

/// A composition with neither image nor caption is a backend defect, not
/// a result. Enforced here for every adapter behind the facade.
fn require_content(
    composition: Composition,
    provider: &str,
    operation: &'static str,
) -> Result<Composition, GarbError> {
    if composition.image_base64.is_none() && composition.caption.is_none() {
        return Err(GarbError::EmptyResponse {
            provider: provider.to_string(),
            operation,
        });
    }
    Ok(composition)
}
