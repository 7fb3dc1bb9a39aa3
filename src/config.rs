//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section and field has a default, so a partial or empty file
//! is valid and a missing file can fall back to `AppConfig::default()`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::types::Locale;

/// Environment variable that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "ODDSIGHT_CONFIG";

/// Config file used when `ODDSIGHT_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Placeholder names and report language.
    pub locale: Locale,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,
    pub database_url: String,
    pub max_connections: u32,
    /// Number of entries returned by history lookups.
    pub history_limit: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_url: "sqlite://bets.db".to_string(),
            max_connections: 5,
            history_limit: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    pub enabled: bool,
    /// Tesseract executable, resolved through `PATH` if not absolute.
    pub binary: String,
    /// Tesseract language spec, e.g. `rus+eng`.
    pub languages: String,
    pub timeout_secs: u64,
    /// Grayscale, contrast-stretch and sharpen images before recognition.
    pub preprocess: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "tesseract".to_string(),
            languages: "rus+eng".to_string(),
            timeout_secs: 60,
            preprocess: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `ODDSIGHT_CONFIG` (or `config.toml`). A missing file
    /// yields the defaults; an unreadable or invalid one is an error.
    pub fn load_from_env() -> Result<(Self, Option<String>)> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if Path::new(&path).exists() {
            Ok((Self::load(&path)?, Some(path)))
        } else {
            Ok((Self::default(), None))
        }
    }

    fn validate(&self) -> Result<()> {
        if self.storage.enabled && self.storage.database_url.trim().is_empty() {
            anyhow::bail!("storage.database_url must be set when storage is enabled");
        }
        if self.storage.max_connections == 0 {
            anyhow::bail!("storage.max_connections must be at least 1");
        }
        if self.ocr.enabled && self.ocr.timeout_secs == 0 {
            anyhow::bail!("ocr.timeout_secs must be positive when OCR is enabled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.analysis.locale, Locale::Ru);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.history_limit, 10);
        assert_eq!(cfg.ocr.languages, "rus+eng");
    }

    #[test]
    fn test_partial_config() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [analysis]
            locale = "en"

            [server]
            port = 9000

            [storage]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.locale, Locale::En);
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(!cfg.storage.enabled);
        assert!(cfg.ocr.enabled);
        assert!(cfg.ocr.preprocess);
    }

    #[test]
    fn test_unknown_locale_rejected() {
        assert!(AppConfig::from_toml_str("[analysis]\nlocale = \"de\"").is_err());
    }

    #[test]
    fn test_validation() {
        assert!(AppConfig::from_toml_str("[storage]\ndatabase_url = \"\"").is_err());
        assert!(AppConfig::from_toml_str("[storage]\nenabled = false\ndatabase_url = \"\"").is_ok());
        assert!(AppConfig::from_toml_str("[storage]\nmax_connections = 0").is_err());
        assert!(AppConfig::from_toml_str("[ocr]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn test_load_shipped_config_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml");
        let cfg = AppConfig::load(path).unwrap();
        assert_eq!(cfg.analysis.locale, Locale::Ru);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.database_url, "sqlite://bets.db");
        assert_eq!(cfg.storage.history_limit, 10);
        assert_eq!(cfg.ocr.languages, "rus+eng");
        assert!(cfg.ocr.preprocess);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = AppConfig::load("/tmp/oddsight_no_such_config.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
