//! Developer-API backend. Geo-restricted: requests from unsupported
//! regions fail with a "location is not supported" body, which the wire
//! layer surfaces as `GeoRestricted` so the prober can log it distinctly.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::{IMAGE_TIMEOUT, Stylist, TEXT_TIMEOUT, http_client};
use crate::closet::{
    ClothingItem, Composition, GarmentSpec, OutfitCritique, StyleFeedback, StyleRecommendation,
};
use crate::config::Config;
use crate::error::GarbError;
use crate::prompt;
use crate::wire::{self, GenerateResponse, RecommendationList};

const PROVIDER: &str = "direct";

pub struct DirectStylist {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    image_model: String,
    text_model: String,
}

impl fmt::Debug for DirectStylist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectStylist")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .finish()
    }
}

impl DirectStylist {
    pub fn new(config: &Config) -> Result<Self, GarbError> {
        let api_key = config
            .direct
            .api_key
            .clone()
            .ok_or_else(|| GarbError::Configuration {
                message: "GEMINI_API_KEY is not set".to_string(),
            })?;

        Ok(Self {
            client: http_client()?,
            base_url: config.direct.base_url().trim_end_matches('/').to_string(),
            api_key,
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate(
        &self,
        model: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<GenerateResponse, GarbError> {
        tracing::debug!(provider = PROVIDER, model = model, "generateContent request");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GarbError::Timeout(timeout.as_millis() as u64)
                } else {
                    GarbError::Request(e)
                }
            })?;

        wire::read_generate_response(response, PROVIDER).await
    }
}

#[async_trait]
impl Stylist for DirectStylist {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn try_on(
        &self,
        subject: &str,
        items: &[ClothingItem],
    ) -> Result<Composition, GarbError> {
        let mut parts = vec![
            wire::image_part(subject),
            wire::text_part(&prompt::try_on(items)),
        ];
        for item in items {
            parts.push(wire::image_part(&item.image_url));
        }

        let body = wire::user_request(parts, wire::image_config());
        self.generate(&self.image_model, &body, IMAGE_TIMEOUT)
            .await?
            .into_composition(PROVIDER, "try_on")
    }

    async fn design_outfit(&self, subject: &str) -> Result<Composition, GarbError> {
        // Two steps: a text concept, then a render. The concept survives as
        // the caption when the render step yields no image, so a refusal
        // degrades to a text-only result instead of failing.
        let concept_body = wire::user_request(
            vec![wire::text_part(&prompt::design_concept())],
            wire::text_config(),
        );
        let concept = self
            .generate(&self.text_model, &concept_body, TEXT_TIMEOUT)
            .await?
            .require_text(PROVIDER, "design_outfit")?;

        let render_body = wire::user_request(
            vec![
                wire::image_part(subject),
                wire::text_part(&prompt::design_render(&concept)),
            ],
            wire::image_config(),
        );
        let rendered = self
            .generate(&self.image_model, &render_body, IMAGE_TIMEOUT)
            .await?;

        let image_base64 = rendered.first_image().map(str::to_string);
        let caption = match image_base64 {
            Some(_) => rendered.joined_text().or(Some(concept)),
            None => Some(concept),
        };
        Ok(Composition {
            image_base64,
            caption,
        })
    }

    async fn recommend_styles(
        &self,
        closet: &[ClothingItem],
        feedback: Option<&StyleFeedback>,
    ) -> Result<Vec<StyleRecommendation>, GarbError> {
        let body = wire::user_request(
            vec![wire::text_part(&prompt::recommend(closet, feedback))],
            wire::structured_config::<RecommendationList>(),
        );
        let text = self
            .generate(&self.text_model, &body, TEXT_TIMEOUT)
            .await?
            .require_text(PROVIDER, "recommend_styles")?;

        let list: RecommendationList = wire::parse_structured(&text, "style recommendations")?;
        Ok(list.recommendations)
    }

    async fn generate_garment(&self, spec: &GarmentSpec) -> Result<String, GarbError> {
        let body = wire::user_request(
            vec![wire::text_part(&prompt::garment(spec))],
            wire::image_config(),
        );
        self.generate(&self.image_model, &body, IMAGE_TIMEOUT)
            .await?
            .require_image(PROVIDER, "generate_garment")
    }

    async fn critique_outfit(&self, subject: &str) -> Result<OutfitCritique, GarbError> {
        let body = wire::user_request(
            vec![
                wire::image_part(subject),
                wire::text_part(&prompt::critique()),
            ],
            wire::structured_config::<OutfitCritique>(),
        );
        let text = self
            .generate(&self.text_model, &body, TEXT_TIMEOUT)
            .await?
            .require_text(PROVIDER, "critique_outfit")?;

        wire::parse_structured(&text, "outfit critique")
    }
}
