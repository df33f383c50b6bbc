//! Configuration management for docsift.
//!
//! Settings come from an optional config file (TOML, YAML or JSON, picked by
//! extension) with environment variable overrides on top.
//!
//! Discovery is a fixed, synchronous search (`--config`, `DOCSIFT_CONFIG`,
//! `./docsift.toml`, then the user config dir) rather than `prefer`, whose
//! loader is async and would need a runtime this blocking CLI does not have.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::{LanguageMap, DEFAULT_DPI};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "DOCSIFT_CONFIG";

/// Environment variable overriding the Tika server endpoint.
pub const TIKA_ENDPOINT_ENV: &str = "TIKA_SERVER_ENDPOINT";

/// Environment variable overriding the OCR model directory.
pub const MODEL_DIR_ENV: &str = "DOCSIFT_OCR_MODEL_DIR";

/// Default config filename looked up in the working directory.
const LOCAL_CONFIG_FILENAME: &str = "docsift.toml";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Apache Tika server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TikaSettings {
    /// Set to false to skip the structured extractor entirely.
    pub enabled: bool,
    /// Base URL of the Tika server.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TikaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:9998".to_string(),
            timeout_secs: 120,
        }
    }
}

/// OCR settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Rasterization resolution.
    pub dpi: u32,
    /// Directory holding OCRS models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
    /// Allow downloading missing OCRS models.
    pub download_models: bool,
    /// Extra language code remaps (e.g. `deu = "de"`).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub language_map: BTreeMap<String, String>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            model_dir: None,
            download_models: true,
            language_map: BTreeMap::new(),
        }
    }
}

impl OcrSettings {
    /// Built-in remap table extended with configured entries.
    pub fn language_map(&self) -> LanguageMap {
        LanguageMap::with_overrides(&self.language_map)
    }
}

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tika: TikaSettings,
    pub ocr: OcrSettings,
    /// File the settings were loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from an explicit path, or discover a config file.
    ///
    /// Discovery order: `DOCSIFT_CONFIG`, `./docsift.toml`, then
    /// `<config dir>/docsift/config.toml`. No file means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(expand_path(&path.to_string_lossy())),
            None => Self::discover(),
        };

        let settings = match path {
            Some(path) => Self::load_from_path(&path)?,
            None => Self::default(),
        };

        Ok(settings.with_env_overrides())
    }

    /// Candidate config files, in priority order.
    fn candidate_paths(lookup: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
        [
            lookup(CONFIG_ENV)
                .filter(|p| !p.is_empty())
                .map(|p| expand_path(&p)),
            Some(PathBuf::from(LOCAL_CONFIG_FILENAME)),
            dirs::config_dir().map(|d| d.join("docsift").join("config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn discover() -> Option<PathBuf> {
        Self::candidate_paths(|key| std::env::var(key).ok())
            .into_iter()
            .find(|p| p.is_file())
    }

    /// Load configuration from a specific file path.
    /// Supports TOML, YAML and JSON based on file extension.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut settings: Settings = match ext {
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?
            }
            "json" => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
            _ => toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
        };

        if let Some(model_dir) = settings.ocr.model_dir.take() {
            let resolved = expand_path(&model_dir.to_string_lossy());
            settings.ocr.model_dir = Some(match path.parent() {
                Some(base) if resolved.is_relative() => base.join(resolved),
                _ => resolved,
            });
        }

        settings.source_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(endpoint) = lookup(TIKA_ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            self.tika.endpoint = endpoint;
        }
        if let Some(model_dir) = lookup(MODEL_DIR_ENV).filter(|v| !v.is_empty()) {
            self.ocr.model_dir = Some(expand_path(&model_dir));
        }
        self
    }
}

/// Expand a leading `~` in a path.
fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_candidate_paths_order() {
        let paths = Settings::candidate_paths(|key| {
            (key == CONFIG_ENV).then(|| "/etc/docsift/custom.yaml".to_string())
        });
        assert_eq!(paths[0], PathBuf::from("/etc/docsift/custom.yaml"));
        assert_eq!(paths[1], PathBuf::from(LOCAL_CONFIG_FILENAME));
        if let Some(config_dir) = dirs::config_dir() {
            assert_eq!(paths[2], config_dir.join("docsift").join("config.toml"));
        }

        let paths = Settings::candidate_paths(|_| None);
        assert_eq!(paths[0], PathBuf::from(LOCAL_CONFIG_FILENAME));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.tika.enabled);
        assert_eq!(settings.tika.endpoint, "http://localhost:9998");
        assert_eq!(settings.tika.timeout_secs, 120);
        assert_eq!(settings.ocr.dpi, 300);
        assert!(settings.ocr.download_models);
        assert_eq!(settings.ocr.language_map().map("eng"), "en");
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            r#"
[tika]
endpoint = "http://tika.internal:9998"

[ocr]
dpi = 200
model_dir = "/opt/models"

[ocr.language_map]
deu = "de"
"#,
        );

        let settings = Settings::load_from_path(file.path()).unwrap();
        assert_eq!(settings.tika.endpoint, "http://tika.internal:9998");
        assert!(settings.tika.enabled);
        assert_eq!(settings.ocr.dpi, 200);
        assert_eq!(settings.ocr.model_dir, Some(PathBuf::from("/opt/models")));
        assert_eq!(settings.ocr.language_map().map("deu"), "de");
        assert_eq!(settings.ocr.language_map().map("eng"), "en");
        assert_eq!(settings.source_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(".yaml", "tika:\n  enabled: false\nocr:\n  download_models: false\n");
        let settings = Settings::load_from_path(file.path()).unwrap();
        assert!(!settings.tika.enabled);
        assert!(!settings.ocr.download_models);
        assert_eq!(settings.ocr.dpi, 300);
    }

    #[test]
    fn test_load_json() {
        let file = write_config(".json", r#"{"tika": {"timeout_secs": 5}}"#);
        let settings = Settings::load_from_path(file.path()).unwrap();
        assert_eq!(settings.tika.timeout_secs, 5);
        assert_eq!(settings.tika.endpoint, "http://localhost:9998");
    }

    #[test]
    fn test_relative_model_dir_resolves_against_config_file() {
        let file = write_config(".toml", "[ocr]\nmodel_dir = \"models\"\n");
        let settings = Settings::load_from_path(file.path()).unwrap();
        let expected = file.path().parent().unwrap().join("models");
        assert_eq!(settings.ocr.model_dir, Some(expected));
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config(".toml", "[tika\nendpoint = ");
        assert!(matches!(
            Settings::load_from_path(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_config() {
        let result = Settings::load(Some(Path::new("/nonexistent/docsift/config.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::default().with_overrides_from(|key| match key {
            TIKA_ENDPOINT_ENV => Some("http://other:9998".to_string()),
            MODEL_DIR_ENV => Some("/srv/ocrs".to_string()),
            _ => None,
        });
        assert_eq!(settings.tika.endpoint, "http://other:9998");
        assert_eq!(settings.ocr.model_dir, Some(PathBuf::from("/srv/ocrs")));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let settings = Settings::default().with_overrides_from(|_| Some(String::new()));
        assert_eq!(settings, Settings::default());
    }
}
