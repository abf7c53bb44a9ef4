//! Configuration loading and validation for Turnguard.
//!
//! Loads `turnguard.toml` (or the file named by `TURNGUARD_CONFIG`) with
//! environment variable overrides. The loaded value is handed to the hook
//! once at registration and only read afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `turnguard.toml`. Every field has a default, so an
/// absent or empty file yields a fully working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Master switch; when off, every interception passes through
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-request behavior switches
    #[serde(default)]
    pub runtime: RuntimeOptions,

    /// Logging behavior
    #[serde(default)]
    pub log: LogOptions,
}

fn default_true() -> bool {
    true
}

/// Switches consulted on every intercepted request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeOptions {
    /// Intercept group-chat prompts
    #[serde(default = "default_true")]
    pub apply_group: bool,

    /// Intercept private-chat prompts
    #[serde(default = "default_true")]
    pub apply_private: bool,

    /// Intercept rewrite-style prompts too
    #[serde(default = "default_true")]
    pub apply_rewrite: bool,

    /// Merge consecutive same-speaker messages into one turn
    #[serde(default = "default_true")]
    pub merge_consecutive: bool,

    /// History window size; 0 means "use the host default"
    #[serde(default)]
    pub history_window_override: u32,

    /// On store failure, keep the original flattened request instead of
    /// surfacing an error
    #[serde(default = "default_true")]
    pub fallback_to_original: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            apply_group: true,
            apply_private: true,
            apply_rewrite: true,
            merge_consecutive: true,
            history_window_override: 0,
            fallback_to_original: true,
        }
    }
}

/// Logging behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogOptions {
    /// Promote per-request skip logs from debug to info
    #[serde(default)]
    pub verbose: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self { verbose: false }
    }
}

impl GuardConfig {
    /// Load configuration from the default location.
    ///
    /// The path is `$TURNGUARD_CONFIG` when set, else `./turnguard.toml`.
    /// Environment overrides applied afterwards:
    /// - `TURNGUARD_DISABLED=1` forces `enabled = false`
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("TURNGUARD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("turnguard.toml"));
        let mut config = Self::load_from(&path)?;

        if std::env::var("TURNGUARD_DISABLED").as_deref() == Ok("1") {
            config.enabled = false;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.history_window_override > 1000 {
            return Err(ConfigError::ValidationError(
                "runtime.history_window_override must be at most 1000".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            runtime: RuntimeOptions::default(),
            log: LogOptions::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = GuardConfig::default();
        assert!(config.enabled);
        assert!(config.runtime.apply_group);
        assert!(config.runtime.apply_private);
        assert!(config.runtime.fallback_to_original);
        assert_eq!(config.runtime.history_window_override, 0);
        assert!(!config.log.verbose);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = GuardConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: GuardConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.enabled, config.enabled);
        assert_eq!(parsed.runtime.merge_consecutive, config.runtime.merge_consecutive);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: GuardConfig = toml::from_str("[runtime]\napply_rewrite = false\n").unwrap();
        assert!(config.enabled);
        assert!(!config.runtime.apply_rewrite);
        assert!(config.runtime.apply_group);
        assert!(config.runtime.merge_consecutive);
    }

    #[test]
    fn oversized_window_override_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runtime]\nhistory_window_override = 5000").unwrap();

        let err = GuardConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = GuardConfig::load_from(Path::new("/nonexistent/turnguard.toml"));
        assert!(result.is_ok());
        assert!(result.unwrap().enabled);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "enabled = \"definitely\"").unwrap();

        let err = GuardConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn file_values_survive_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "enabled = false\n[runtime]\nhistory_window_override = 12\n[log]\nverbose = true"
        )
        .unwrap();

        let config = GuardConfig::load_from(file.path()).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.runtime.history_window_override, 12);
        assert!(config.log.verbose);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = GuardConfig::default_toml();
        assert!(toml_str.contains("enabled = true"));
        assert!(toml_str.contains("history_window_override = 0"));
    }
}
