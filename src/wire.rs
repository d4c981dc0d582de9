//! Shared `generateContent` wire format for the Gemini-family backends.
//!
//! Both HTTP backends (developer API and Vertex) speak the same request and
//! response JSON; only the URL and auth header differ. This module owns the
//! request builders, the typed response shape, and the status-code triage.

use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::closet::{Composition, StyleRecommendation};
use crate::error::GarbError;

/// Max response body size (8MB — inline image payloads are large).
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Request building
// ---------------------------------------------------------------------------

pub fn text_part(text: &str) -> Value {
    json!({"text": text})
}

/// Inline-image part from either a `data:` URL or bare base64.
pub fn image_part(source: &str) -> Value {
    let (mime, data) = split_data_url(source);
    json!({"inlineData": {"mimeType": mime, "data": data}})
}

/// Split a `data:<mime>;base64,<payload>` URL into (mime, payload).
/// Bare base64 passes through with an assumed `image/png` mime.
pub fn split_data_url(source: &str) -> (&str, &str) {
    if let Some(rest) = source.strip_prefix("data:") {
        if let Some((meta, data)) = rest.split_once(',') {
            let mime = meta.strip_suffix(";base64").unwrap_or(meta);
            return (if mime.is_empty() { "image/png" } else { mime }, data);
        }
    }
    ("image/png", source)
}

/// Single-turn user request body with the given generation config.
pub fn user_request(parts: Vec<Value>, generation_config: Value) -> Value {
    json!({
        "contents": [{"role": "user", "parts": parts}],
        "generationConfig": generation_config,
    })
}

/// Generation config for image operations. TEXT stays enabled so the model
/// can attach a caption, or explain itself when it declines to render.
pub fn image_config() -> Value {
    json!({"responseModalities": ["IMAGE", "TEXT"]})
}

/// Generation config for plain-text replies.
pub fn text_config() -> Value {
    json!({"responseModalities": ["TEXT"]})
}

/// Generation config for structured JSON output conforming to `T`.
pub fn structured_config<T: JsonSchema>() -> Value {
    json!({
        "responseMimeType": "application/json",
        "responseJsonSchema": response_schema::<T>(),
    })
}

/// JSON schema for `T` as the API expects it: the draft identifier is
/// stripped because the endpoint rejects unknown top-level keys.
pub fn response_schema<T: JsonSchema>() -> Value {
    let mut value = schemars::SchemaGenerator::default()
        .into_root_schema_for::<T>()
        .to_value();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
    }
    value
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// `generateContent` response body. Only the fields we read.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// One response part. Vertex serializes `inline_data` in snake_case,
/// the developer API in camelCase; accept both.
#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: Option<String>,
}

impl GenerateResponse {
    /// First non-empty inline image across all candidates, as bare base64.
    pub fn first_image(&self) -> Option<&str> {
        self.candidates
            .iter()
            .flat_map(|c| c.content.iter())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.inline_data.as_ref())
            .filter_map(|inline| inline.data.as_deref())
            .find(|data| !data.is_empty())
    }

    /// All text parts joined with newlines, or None when there are none.
    pub fn joined_text(&self) -> Option<String> {
        let joined = self
            .candidates
            .iter()
            .flat_map(|c| c.content.iter())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if joined.is_empty() { None } else { Some(joined) }
    }

    /// Image-and/or-caption result. A response carrying neither is an
    /// `EmptyResponse`, never a `(None, None)` composition.
    pub fn into_composition(
        self,
        provider: &str,
        operation: &'static str,
    ) -> Result<Composition, GarbError> {
        let image_base64 = self.first_image().map(str::to_string);
        let caption = self.joined_text();
        if image_base64.is_none() && caption.is_none() {
            return Err(GarbError::EmptyResponse {
                provider: provider.to_string(),
                operation,
            });
        }
        Ok(Composition {
            image_base64,
            caption,
        })
    }

    /// Exactly one image, as bare base64. No image is an `EmptyResponse`.
    pub fn require_image(
        self,
        provider: &str,
        operation: &'static str,
    ) -> Result<String, GarbError> {
        self.first_image()
            .map(str::to_string)
            .ok_or_else(|| GarbError::EmptyResponse {
                provider: provider.to_string(),
                operation,
            })
    }

    /// Non-empty text. No text is an `EmptyResponse`.
    pub fn require_text(
        self,
        provider: &str,
        operation: &'static str,
    ) -> Result<String, GarbError> {
        self.joined_text().ok_or_else(|| GarbError::EmptyResponse {
            provider: provider.to_string(),
            operation,
        })
    }
}

// ---------------------------------------------------------------------------
// Status triage and body reading
// ---------------------------------------------------------------------------

/// Geo-blocked requests come back as 400 (FAILED_PRECONDITION) or 403 with
/// a "location is not supported" message in the body.
pub fn is_geo_block(status: reqwest::StatusCode, body: &str) -> bool {
    (status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::FORBIDDEN)
        && body.to_lowercase().contains("location is not supported")
}

/// Map a non-success HTTP status (plus its error body) onto the error
/// taxonomy. Geo restriction is checked first: it arrives on status codes
/// that would otherwise triage as auth or generic upstream failures.
pub fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> GarbError {
    if is_geo_block(status, body) {
        return GarbError::GeoRestricted {
            provider: provider.to_string(),
        };
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return GarbError::RateLimited {
            provider: provider.to_string(),
        };
    }

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return GarbError::AuthFailed {
            provider: provider.to_string(),
            message: format!("{status}"),
        };
    }

    GarbError::Upstream {
        provider: provider.to_string(),
        message: format!("{status}: {body}"),
        status: Some(status.as_u16()),
    }
}

/// Read and parse a `generateContent` reply, triaging non-success statuses
/// and capping body reads to `MAX_RESPONSE_BYTES`.
pub async fn read_generate_response(
    response: reqwest::Response,
    provider: &str,
) -> Result<GenerateResponse, GarbError> {
    let status = response.status();

    if !status.is_success() {
        let error_bytes = response.bytes().await.unwrap_or_default();
        let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
        let body = String::from_utf8_lossy(truncated);
        return Err(status_error(provider, status, &body));
    }

    let bytes = response.bytes().await.map_err(|e| GarbError::Upstream {
        provider: provider.to_string(),
        message: format!("failed to read response body: {e}"),
        status: None,
    })?;

    if bytes.len() > MAX_RESPONSE_BYTES {
        return Err(GarbError::Upstream {
            provider: provider.to_string(),
            message: format!(
                "response too large: {} bytes (max {})",
                bytes.len(),
                MAX_RESPONSE_BYTES
            ),
            status: None,
        });
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| GarbError::SchemaParse(format!("generateContent response: {e}")))
}

// ---------------------------------------------------------------------------
// Structured output
// ---------------------------------------------------------------------------

/// Wrapper the recommendation schema asks the model to produce. A top-level
/// object keeps the structured-output contract stable if fields grow.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecommendationList {
    pub recommendations: Vec<StyleRecommendation>,
}

/// Parse structured model output into `T`. Tries the raw text first, then
/// the outermost `{...}` span, then a fence-stripped pass, since models
/// wrap JSON in markdown fences more often than they should.
pub fn parse_structured<T: DeserializeOwned>(
    text: &str,
    what: &'static str,
) -> Result<T, GarbError> {
    if let Ok(v) = serde_json::from_str::<T>(text) {
        return Ok(v);
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(v) = serde_json::from_str::<T>(&text[start..=end]) {
                return Ok(v);
            }
        }
    }
    let cleaned = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str::<T>(cleaned).map_err(|e| GarbError::SchemaParse(format!("{what}: {e}")))
}
