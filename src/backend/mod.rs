pub mod direct;
pub mod mock;
pub mod proxied;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::closet::{
    ClothingItem, Composition, GarmentSpec, OutfitCritique, StyleFeedback, StyleRecommendation,
};
use crate::config::{BackendKind, Config};
use crate::error::GarbError;

/// Image synthesis is slow; give it room.
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Text and structured-output calls.
pub const TEXT_TIMEOUT: Duration = Duration::from_secs(60);

/// One wardrobe backend. All three implementations expose the same five
/// operations so the selector and facade never care which one they hold.
///
/// Calls are stateless request/response round-trips: no retries, no local
/// mutation. Retry-or-fallback policy lives with the selector.
#[async_trait]
pub trait Stylist: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Composite the described garments onto the subject photo.
    /// `subject` is a base64 image or data URL.
    async fn try_on(
        &self,
        subject: &str,
        items: &[ClothingItem],
    ) -> Result<Composition, GarbError>;

    /// Invent an outfit and render it onto the subject. Degrades to a
    /// caption-only composition when the backend describes an outfit but
    /// declines to render it.
    async fn design_outfit(&self, subject: &str) -> Result<Composition, GarbError>;

    /// Outfit combinations from the closet, steered by prior feedback.
    /// Tolerates a short or empty closet; may return fewer than 3.
    async fn recommend_styles(
        &self,
        closet: &[ClothingItem],
        feedback: Option<&StyleFeedback>,
    ) -> Result<Vec<StyleRecommendation>, GarbError>;

    /// Synthesize a garment product shot from a text description.
    /// Returns bare base64 image data.
    async fn generate_garment(&self, spec: &GarmentSpec) -> Result<String, GarbError>;

    /// Score and critique the outfit in the subject photo.
    async fn critique_outfit(&self, subject: &str) -> Result<OutfitCritique, GarbError>;
}

/// Builds an adapter for a backend kind. The selector owns one of these;
/// swapping it out lets tests count constructions and substitute stubs.
pub trait BackendFactory: Send + Sync {
    fn build(&self, kind: BackendKind, config: &Config) -> Result<Arc<dyn Stylist>, GarbError>;
}

/// Production factory over the three real adapters.
pub struct DefaultFactory;

impl BackendFactory for DefaultFactory {
    fn build(&self, kind: BackendKind, config: &Config) -> Result<Arc<dyn Stylist>, GarbError> {
        match kind {
            BackendKind::Direct => Ok(Arc::new(direct::DirectStylist::new(config)?)),
            BackendKind::Proxied => Ok(Arc::new(proxied::ProxiedStylist::new(config)?)),
            BackendKind::Mock => Ok(Arc::new(mock::MockStylist::new())),
        }
    }
}

/// HTTP client with the connection tuning both HTTP backends share.
/// Per-request timeouts are set at the call sites.
pub(crate) fn http_client() -> Result<reqwest::Client, GarbError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(4)
        .build()
        .map_err(|e| GarbError::Configuration {
            message: format!("failed to build HTTP client: {e}"),
        })
}
