use std::path::{Path, PathBuf};

use larder_ocr::{OrchestratorConfig, PreprocessConfig, OCR_SPACE_ENDPOINT};
use larder_parse::ParserConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Everything `larder` reads from `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LarderConfig {
    pub ocr: OcrSettings,
    pub preprocess: PreprocessConfig,
    pub parser: ParserConfig,
    /// Extra line rules merged over the built-in set.
    pub rules_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrSettings {
    /// `tesseract`, `ocr_space` or `mock`.
    pub primary: String,
    pub secondary: Option<String>,
    pub language: String,
    pub tessdata_path: Option<String>,
    pub ocr_space_endpoint: String,
    /// Name of the environment variable holding the OCR.space key.
    pub api_key_env: String,
    /// Caps in-flight OCR.space requests; 0 disables the limit.
    pub max_concurrent_requests: usize,
    /// Text returned by the `mock` engine, for dry runs.
    pub mock_text_file: Option<PathBuf>,
    pub orchestrator: OrchestratorConfig,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            primary: "tesseract".to_string(),
            secondary: Some("ocr_space".to_string()),
            language: "eng".to_string(),
            tessdata_path: None,
            ocr_space_endpoint: OCR_SPACE_ENDPOINT.to_string(),
            api_key_env: "OCR_SPACE_API_KEY".to_string(),
            max_concurrent_requests: 2,
            mock_text_file: None,
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

impl LarderConfig {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&content, path)
    }

    /// An explicit path must exist. Without one, the platform config file is
    /// used when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "larder", "Larder")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
