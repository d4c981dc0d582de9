use thiserror::Error;

#[derive(Debug, Error)]
pub enum GarbError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("auth failed for {provider}: {message}")]
    AuthFailed { provider: String, message: String },

    #[error("{provider} rejected the caller's location")]
    GeoRestricted { provider: String },

    #[error("{provider} returned neither image nor text for {operation}")]
    EmptyResponse {
        provider: String,
        operation: &'static str,
    },

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("process exited with code {code}: {stderr}")]
    ProcessExit { code: i32, stderr: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl GarbError {
    /// Extract provider name from structured error variants.
    /// Returns None for variants that don't carry provider context.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimited { provider } => Some(provider),
            Self::Upstream { provider, .. } => Some(provider),
            Self::AuthFailed { provider, .. } => Some(provider),
            Self::GeoRestricted { provider } => Some(provider),
            Self::EmptyResponse { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Returns true when the upstream rejected the caller's geographic
    /// location. The prober logs this case separately from ordinary
    /// transport failures; the fallback outcome is the same.
    pub fn is_geo_restricted(&self) -> bool {
        matches!(self, Self::GeoRestricted { .. })
    }

    /// Produce a sanitized error message safe for showing to users.
    /// Does not leak credentials, internal URLs, or full upstream bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { message } => format!("configuration error: {message}"),
            Self::Timeout(ms) => format!("request timed out after {ms}ms"),
            Self::RateLimited { provider } => {
                format!("rate limited by {provider} — try again shortly")
            }
            Self::Upstream {
                provider, message, ..
            } => {
                format!("upstream error from {provider}: {}", tail(message, 200))
            }
            Self::AuthFailed { provider, message } => {
                format!("authentication failed for {provider}: {message}")
            }
            Self::GeoRestricted { provider } => format!(
                "{provider} is not available from this location"
            ),
            Self::EmptyResponse {
                provider,
                operation,
            } => format!("{provider} returned an empty result for {operation}"),
            Self::SchemaParse(_) => "failed to parse backend response".to_string(),
            Self::ProcessExit { code, stderr } => {
                if stderr.trim().is_empty() {
                    format!("helper process exited with code {code}")
                } else {
                    // Take the tail — CLI tools dump banners first, the
                    // actual error is at the end.
                    let preview = tail(stderr, 200);
                    let prefix = if preview.len() < stderr.len() { "..." } else { "" };
                    format!("helper process exited with code {code}: {prefix}{preview}")
                }
            }
            Self::Request(_) => "request to backend failed".to_string(),
            Self::Other(msg) => msg.clone(),
        }
    }
}

/// Last `n` chars of `s` (char-safe).
fn tail(s: &str, n: usize) -> String {
    s.chars()
        .rev()
        .take(n)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_extracted_from_structured_variants() {
        let err = GarbError::GeoRestricted {
            provider: "gemini".to_string(),
        };
        assert_eq!(err.provider(), Some("gemini"));
        assert!(err.is_geo_restricted());

        let err = GarbError::Timeout(500);
        assert_eq!(err.provider(), None);
        assert!(!err.is_geo_restricted());
    }

    #[test]
    fn user_message_truncates_long_upstream_bodies() {
        let err = GarbError::Upstream {
            provider: "vertex".to_string(),
            message: "y".repeat(5000),
            status: Some(500),
        };
        assert!(err.user_message().len() < 300);
    }

    #[test]
    fn process_exit_message_keeps_stderr_tail() {
        let err = GarbError::ProcessExit {
            code: 1,
            stderr: format!("{}RESOURCE_EXHAUSTED", "banner\n".repeat(100)),
        };
        let msg = err.user_message();
        assert!(msg.contains("code 1"));
        assert!(msg.contains("RESOURCE_EXHAUSTED"));
        assert!(msg.starts_with("helper process exited with code 1: ..."));
    }

    #[test]
    fn empty_response_names_operation() {
        let err = GarbError::EmptyResponse {
            provider: "mock".to_string(),
            operation: "try_on",
        };
        assert!(err.user_message().contains("try_on"));
    }
}
