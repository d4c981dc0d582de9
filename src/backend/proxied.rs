//! Vertex AI backend. Same wire format as the developer API, reached
//! through a regional endpoint that is not geo-restricted. Auth is a
//! Bearer token minted by the `gcloud` CLI from application-default
//! credentials, cached until it nears expiry.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::backend::{IMAGE_TIMEOUT, Stylist, TEXT_TIMEOUT, http_client};
use crate::closet::{
    ClothingItem, Composition, GarmentSpec, OutfitCritique, StyleFeedback, StyleRecommendation,
};
use crate::config::Config;
use crate::error::GarbError;
use crate::prompt;
use crate::wire::{self, GenerateResponse, RecommendationList};

const PROVIDER: &str = "proxied";

const TOKEN_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Access tokens live for an hour; refresh well before that.
const TOKEN_TTL: Duration = Duration::from_secs(45 * 60);

struct CachedToken {
    token: String,
    fetched_at: Instant,
}

pub struct ProxiedStylist {
    client: reqwest::Client,
    base_url: String,
    token_source: Box<dyn TokenSource>,
    token: Mutex<Option<CachedToken>>,
    image_model: String,
    text_model: String,
}

impl fmt::Debug for ProxiedStylist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxiedStylist")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .finish()
    }
}

impl ProxiedStylist {
    pub fn new(config: &Config) -> Result<Self, GarbError> {
        let project_id = config
            .proxied
            .project_id
            .clone()
            .ok_or_else(|| GarbError::Configuration {
                message: "GOOGLE_CLOUD_PROJECT is not set".to_string(),
            })?;

        let credentials_path = config.proxied.credentials_path.clone();
        if let Some(ref path) = credentials_path {
            if !path.exists() {
                return Err(GarbError::Configuration {
                    message: format!("credentials file not found: {}", path.display()),
                });
            }
        }

        let region = config.proxied.region();
        Ok(Self {
            client: http_client()?,
            base_url: format!(
                "https://{region}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{region}/publishers/google"
            ),
            token_source: Box::new(GcloudTokenSource { credentials_path }),
            token: Mutex::new(None),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn access_token(&self) -> Result<String, GarbError> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() < TOKEN_TTL {
                return Ok(cached.token.clone());
            }
        }

        let token = self.token_source.fetch().await?;
        *guard = Some(CachedToken {
            token: token.clone(),
            fetched_at: Instant::now(),
        });
        Ok(token)
    }

    async fn generate(
        &self,
        model: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<GenerateResponse, GarbError> {
        let token = self.access_token().await?;
        tracing::debug!(provider = PROVIDER, model = model, "generateContent request");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("Authorization", format!("Bearer {token}"))
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

/// Mints bearer tokens. The adapter owns one of these; swapping it out lets
/// tests exercise the cache without a Google Cloud SDK on the machine.
#[async_trait]
trait TokenSource: Send + Sync {
    async fn fetch(&self) -> Result<String, GarbError>;
}

/// Production source over the `gcloud` CLI.
struct GcloudTokenSource {
    credentials_path: Option<PathBuf>,
}

#[async_trait]
impl TokenSource for GcloudTokenSource {
    async fn fetch(&self) -> Result<String, GarbError> {
        fetch_access_token(self.credentials_path.as_deref()).await
    }
}

/// Run `gcloud auth application-default print-access-token`.
///
/// No shell, piped stdio, own process group so a timeout can kill the whole
/// tree, kill_on_drop as a backstop. `credentials` overrides the ADC path
/// via the subprocess environment only.
async fn fetch_access_token(credentials: Option<&std::path::Path>) -> Result<String, GarbError> {
    let mut cmd = Command::new("gcloud");
    cmd.args(["auth", "application-default", "print-access-token"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    if let Some(path) = credentials {
        cmd.env("GOOGLE_APPLICATION_CREDENTIALS", path);
    }

    let child = cmd.spawn().map_err(|e| GarbError::Configuration {
        message: format!("failed to run gcloud: {e} (is the Google Cloud SDK installed?)"),
    })?;
    let child_pid = child.id();

    let output = match tokio::time::timeout(TOKEN_FETCH_TIMEOUT, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| GarbError::Other(format!("failed to read gcloud output: {e}")))?,
        Err(_) => {
            // Kill the process group, not just the leader
            if let Some(pid) = child_pid {
                unsafe {
                    libc::kill(-(pid as i32), libc::SIGKILL);
                }
            }
            return Err(GarbError::Timeout(TOKEN_FETCH_TIMEOUT.as_millis() as u64));
        }
    };

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        tracing::warn!(code, "gcloud token fetch failed");
        return Err(GarbError::ProcessExit {
            code,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(GarbError::AuthFailed {
            provider: PROVIDER.to_string(),
            message: "gcloud produced an empty access token".to_string(),
        });
    }
    Ok(token)
}

#[async_trait]
impl Stylist for ProxiedStylist {
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
