use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

pub const DEFAULT_DIRECT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Which backend the selector should try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Gemini Developer API, API-key auth. Geo-restricted.
    Direct,
    /// Vertex AI publisher endpoint, project/region/credential auth.
    Proxied,
    /// Deterministic offline backend. Always constructible.
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Proxied => "proxied",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "proxied" => Ok(Self::Proxied),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown backend kind: {other}")),
        }
    }
}

/// Gemini Developer API settings.
#[derive(Clone, Default)]
pub struct DirectConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for DirectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DirectConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_DIRECT_BASE_URL)
    }
}

/// Vertex AI settings.
#[derive(Clone, Debug, Default)]
pub struct ProxiedConfig {
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub credentials_path: Option<PathBuf>,
}

impl ProxiedConfig {
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Backend the selector probes first. Default: direct.
    pub preferred: BackendKind,
    pub direct: DirectConfig,
    pub proxied: ProxiedConfig,
    /// Model used for image compositing/generation.
    pub image_model: String,
    /// Model used for text and structured-output operations.
    pub text_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred: BackendKind::Direct,
            direct: DirectConfig::default(),
            proxied: ProxiedConfig::default(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }
}

/// Optional `garb.toml` shape. Every field may be omitted; the
/// environment overrides whatever the file provides.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    backend: Option<String>,
    #[serde(default)]
    direct: FileDirect,
    #[serde(default)]
    proxied: FileProxied,
    #[serde(default)]
    models: FileModels,
}

#[derive(Debug, Default, Deserialize)]
struct FileDirect {
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileProxied {
    project: Option<String>,
    region: Option<String>,
    credentials: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct FileModels {
    image: Option<String>,
    text: Option<String>,
}

impl FileConfig {
    fn parse(text: &str) -> Option<Self> {
        match toml::from_str(text) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!("ignoring malformed config file: {e}");
                None
            }
        }
    }
}

impl Config {
    /// Read configuration: `garb.toml` (next to the process, or the path in
    /// `GARB_CONFIG`) first, then environment variables on top.
    pub fn load() -> Self {
        let path = env::var("GARB_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("garb.toml"));
        let file = read_file_config(&path).unwrap_or_default();
        Self::from_env_over(file)
    }

    /// Environment only (no config file).
    pub fn from_env() -> Self {
        Self::from_env_over(FileConfig::default())
    }

    fn from_env_over(file: FileConfig) -> Self {
        let preferred = non_empty_env("GARB_BACKEND")
            .or(file.backend)
            .map(|raw| match raw.parse() {
                Ok(kind) => kind,
                Err(e) => {
                    tracing::warn!("{e} — defaulting to direct");
                    BackendKind::Direct
                }
            })
            .unwrap_or(BackendKind::Direct);

        let api_key = non_empty_env("GEMINI_API_KEY")
            .or_else(|| non_empty_env("GOOGLE_API_KEY"))
            .or(file.direct.api_key);
        if api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set — direct backend unavailable");
        }

        let project_id = non_empty_env("GOOGLE_CLOUD_PROJECT").or(file.proxied.project);
        if project_id.is_none() {
            tracing::warn!("GOOGLE_CLOUD_PROJECT not set — proxied backend unavailable");
        }

        Self {
            preferred,
            direct: DirectConfig {
                api_key,
                base_url: non_empty_env("GEMINI_API_BASE").or(file.direct.base_url),
            },
            proxied: ProxiedConfig {
                project_id,
                region: non_empty_env("GOOGLE_CLOUD_REGION").or(file.proxied.region),
                credentials_path: non_empty_env("GOOGLE_APPLICATION_CREDENTIALS")
                    .map(PathBuf::from)
                    .or(file.proxied.credentials),
            },
            image_model: non_empty_env("GARB_IMAGE_MODEL")
                .or(file.models.image)
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            text_model: non_empty_env("GARB_TEXT_MODEL")
                .or(file.models.text)
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
        }
    }
}

fn read_file_config(path: &Path) -> Option<FileConfig> {
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(text) => FileConfig::parse(&text),
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            None
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_known_values() {
        assert_eq!("direct".parse::<BackendKind>().unwrap(), BackendKind::Direct);
        assert_eq!(
            " Proxied ".parse::<BackendKind>().unwrap(),
            BackendKind::Proxied
        );
        assert_eq!("MOCK".parse::<BackendKind>().unwrap(), BackendKind::Mock);
        assert!("gpt".parse::<BackendKind>().is_err());
    }

    #[test]
    fn file_config_parses_full_document() {
        let cfg = FileConfig::parse(
            r#"
            backend = "proxied"

            [direct]
            api_key = "k"

            [proxied]
            project = "wardrobe-prod"
            region = "europe-west4"
            credentials = "/etc/garb/sa.json"

            [models]
            image = "gemini-2.5-flash-image"
        "#,
        )
        .unwrap();
        assert_eq!(cfg.backend.as_deref(), Some("proxied"));
        assert_eq!(cfg.proxied.project.as_deref(), Some("wardrobe-prod"));
        assert_eq!(cfg.models.image.as_deref(), Some("gemini-2.5-flash-image"));
        assert_eq!(cfg.models.text, None);
    }

    #[test]
    fn file_config_tolerates_partial_document() {
        let cfg = FileConfig::parse("backend = \"mock\"").unwrap();
        assert_eq!(cfg.backend.as_deref(), Some("mock"));
        assert!(cfg.direct.api_key.is_none());
    }

    #[test]
    fn malformed_file_config_is_ignored() {
        assert!(FileConfig::parse("backend = [not toml").is_none());
    }

    #[test]
    fn direct_config_debug_redacts_api_key() {
        let cfg = DirectConfig {
            api_key: Some("sk-super-secret".to_string()),
            base_url: None,
        };
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("sk-super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn defaults_fill_models_and_region() {
        let cfg = Config::default();
        assert_eq!(cfg.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(cfg.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(cfg.proxied.region(), DEFAULT_REGION);
        assert_eq!(cfg.direct.base_url(), DEFAULT_DIRECT_BASE_URL);
    }
}
