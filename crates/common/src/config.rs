//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RecomposeError, RecomposeResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Composition and extraction parameters.
    pub composition: CompositionDefaults,

    /// Session snapshot storage.
    pub storage: StorageConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Parameters for extraction, transforms, and composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionDefaults {
    /// Maximum number of vision regions turned into layers.
    pub max_regions: usize,

    /// Resampling filter used when scaling layers.
    pub resample: ResampleFilter,

    /// Run per-layer transforms on the rayon pool.
    pub parallel_transforms: bool,

    /// Caller-level budget for a whole composition (milliseconds).
    pub timeout_ms: u64,
}

/// Resampling filter for layer scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding snapshot files.
    pub root: PathBuf,

    /// Retention limit for named saves.
    pub max_saves: usize,

    /// Retention limit for automatic versions.
    pub max_versions: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "recompose=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for CompositionDefaults {
    fn default() -> Self {
        Self {
            max_regions: 12,
            resample: ResampleFilter::Lanczos3,
            parallel_transforms: true,
            timeout_ms: 30_000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: dirs_default_sessions(),
            max_saves: 200,
            max_versions: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from `$XDG_CONFIG_HOME/recompose/config.json`.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from `path`.
    ///
    /// A missing file yields defaults silently; an unreadable or malformed
    /// one yields defaults with a warning.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load_from(path) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Ignoring unusable config");
                Self::default()
            }
        }
    }

    /// Load config from `path`, failing if it is missing or malformed.
    pub fn try_load_from(path: &Path) -> RecomposeResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RecomposeError::config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| RecomposeError::config(format!("{}: {e}", path.display())))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("recompose").join("config.json")
}

/// Default snapshot directory.
fn dirs_default_sessions() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("recompose").join("sessions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_retention_limits() {
        let config = AppConfig::default();
        assert_eq!(config.composition.max_regions, 12);
        assert_eq!(config.storage.max_saves, 200);
        assert_eq!(config.storage.max_versions, 500);
        assert_eq!(config.composition.resample, ResampleFilter::Lanczos3);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"composition": {"resample": "triangle"}}"#).unwrap();
        assert_eq!(parsed.composition.resample, ResampleFilter::Triangle);
        assert_eq!(parsed.composition.max_regions, 12);
        assert!(parsed.composition.parallel_transforms);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join("recompose_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.composition.max_regions = 4;
        config.logging.json = true;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.composition.max_regions, 4);
        assert!(loaded.logging.json);

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::load_from(&path).composition.max_regions, 12);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_strict_load_reports_config_errors() {
        let dir = std::env::temp_dir().join("recompose_test_config_strict");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let missing = AppConfig::try_load_from(&path).unwrap_err();
        assert!(matches!(missing, RecomposeError::Config { .. }));

        std::fs::write(&path, r#"{"composition": {"max_regions": "many"}}"#).unwrap();
        let malformed = AppConfig::try_load_from(&path).unwrap_err();
        assert!(matches!(malformed, RecomposeError::Config { .. }));
        assert!(malformed.to_string().starts_with("Configuration error:"));

        std::fs::write(&path, r#"{"storage": {"max_saves": 3}}"#).unwrap();
        let loaded = AppConfig::try_load_from(&path).unwrap();
        assert_eq!(loaded.storage.max_saves, 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}
