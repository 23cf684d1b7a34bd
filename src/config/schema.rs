//! Configuration schema types
//!
//! This module defines the configuration structure for the anonymiser.

use crate::config::SecretString;
use crate::scrub::request::ScrubSettings;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Main anonymiser configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymiserConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Hashing key for config hashes and log references
    pub hashing: HashingConfig,

    /// Default scrubbing policy; requests may override any setting
    #[serde(default)]
    pub scrubber: ScrubSettings,

    /// Per-document audit trail
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AnonymiserConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.hashing.validate()?;
        self.scrubber
            .validate()
            .map_err(|e| format!("scrubber: {e}"))?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Scrubber workers used by `scrub` when --workers is not given
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.workers == 0 || self.workers > 64 {
            return Err("application.workers must be between 1 and 64".to_string());
        }

        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            workers: default_workers(),
        }
    }
}

/// Hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Secret key mixed into every hash
    /// Stored securely in memory and automatically zeroized on drop
    pub key: SecretString,
}

impl HashingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.key.expose_secret().is_empty() {
            return Err("hashing.key cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Write one audit entry per scrubbed document
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file
    #[serde(default = "default_audit_log_path")]
    pub log_path: String,

    /// JSON lines (true) or plain text (false)
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.log_path.trim().is_empty() {
            return Err("audit.log_path cannot be empty when audit is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Maximum log file size in MB
    #[serde(default = "default_local_max_size_mb")]
    pub local_max_size_mb: usize,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "size"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_max_size_mb == 0 {
            return Err("logging.local_max_size_mb must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            local_max_size_mb: default_local_max_size_mb(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_audit_log_path() -> String {
    "/var/log/anonymiser/audit.log".to_string()
}

fn default_local_path() -> String {
    "/var/log/anonymiser".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

fn default_local_max_size_mb() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn config() -> AnonymiserConfig {
        AnonymiserConfig {
            application: ApplicationConfig::default(),
            hashing: HashingConfig {
                key: secret_string("site-key".to_string()),
            },
            scrubber: ScrubSettings::default(),
            audit: AuditConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.log_level = "debug".to_string();
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_hashing_key_rejected() {
        let mut config = config();
        assert!(config.validate().is_ok());

        config.hashing.key = secret_string(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.contains("hashing.key"));
    }

    #[test]
    fn test_scrubber_settings_validated() {
        let mut config = config();
        config.scrubber.string_max_regex_errors = 3;
        config.scrubber.min_string_length_for_errors = 2;
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("scrubber:"));
    }

    #[test]
    fn test_audit_config_validation() {
        let mut config = config();
        config.audit.enabled = true;
        config.audit.log_path = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_path, "/var/log/anonymiser");
        assert_eq!(config.local_rotation, "daily");
        assert_eq!(config.local_max_size_mb, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let config = LoggingConfig {
            local_rotation: "weekly".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_minimal_toml() {
        let config: AnonymiserConfig = toml::from_str(
            r#"
[hashing]
key = "abc"
"#,
        )
        .unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.application.workers, 4);
        assert!(config.scrubber.anonymise_strings_at_word_boundaries_only);
        assert!(!config.audit.enabled);
    }
}
