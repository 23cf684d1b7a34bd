//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::AnonymiserConfig;
use super::secret::secret_string;
use crate::domain::errors::AnonymiserError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into AnonymiserConfig
/// 4. Applies environment variable overrides (ANONYMISER_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use anonymiser::config::loader::load_config;
///
/// let config = load_config("anonymiser.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AnonymiserConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AnonymiserError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AnonymiserError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: AnonymiserConfig = toml::from_str(&contents)?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        AnonymiserError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| AnonymiserError::Configuration(e.to_string()))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(AnonymiserError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using ANONYMISER_* prefix
///
/// Environment variables follow the pattern: ANONYMISER_<SECTION>_<KEY>
/// For example: ANONYMISER_HASHING_KEY, ANONYMISER_AUDIT_LOG_PATH
fn apply_env_overrides(config: &mut AnonymiserConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("ANONYMISER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("ANONYMISER_APPLICATION_WORKERS") {
        if let Ok(workers) = val.parse() {
            config.application.workers = workers;
        }
    }

    // Hashing overrides
    if let Ok(val) = std::env::var("ANONYMISER_HASHING_KEY") {
        config.hashing.key = secret_string(val);
    }

    // Scrubber overrides
    if let Ok(val) = std::env::var("ANONYMISER_SCRUBBER_STRING_MAX_REGEX_ERRORS") {
        if let Ok(errors) = val.parse() {
            config.scrubber.string_max_regex_errors = errors;
        }
    }
    if let Ok(val) = std::env::var("ANONYMISER_SCRUBBER_SCRUB_ALL_DATES") {
        config.scrubber.scrub_all_dates = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("ANONYMISER_SCRUBBER_SCRUB_ALL_UK_POSTCODES") {
        config.scrubber.scrub_all_uk_postcodes = val.parse().unwrap_or(false);
    }

    // Audit overrides
    if let Ok(val) = std::env::var("ANONYMISER_AUDIT_ENABLED") {
        config.audit.enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("ANONYMISER_AUDIT_LOG_PATH") {
        config.audit.log_path = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("ANONYMISER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("ANONYMISER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("LOADER_TEST_VAR", "test_value");
        let input = "key = \"${LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "key = \"test_value\"");
        std::env::remove_var("LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("LOADER_MISSING_VAR");
        let input = "key = \"${LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("LOADER_COMMENTED_VAR");
        let input = "# key = \"${LOADER_COMMENTED_VAR}\"\nlevel = \"info\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(AnonymiserError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let temp_file = write_config(
            r#"
[application]
log_level = "debug"
workers = 2

[hashing]
key = "site-secret"

[scrubber]
string_max_regex_errors = 1
scrub_all_numbers_of_n_digits = [10]
replace_patient_info_with = "[PATIENT]"

[audit]
enabled = false
"#,
        );

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.application.workers, 2);
        assert_eq!(config.hashing.key.expose_secret(), "site-secret");
        assert_eq!(config.scrubber.string_max_regex_errors, 1);
        assert_eq!(config.scrubber.scrub_all_numbers_of_n_digits, vec![10]);
        assert_eq!(config.scrubber.replace_patient_info_with, "[PATIENT]");
        assert_eq!(config.scrubber.replace_third_party_info_with, "[__TTT__]");
    }

    #[test]
    fn test_load_config_invalid_scrubber() {
        let temp_file = write_config(
            r#"
[hashing]
key = "site-secret"

[scrubber]
string_max_regex_errors = 9
"#,
        );

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn test_load_config_missing_hashing_section() {
        let temp_file = write_config("[application]\nlog_level = \"info\"\n");
        assert!(load_config(temp_file.path()).is_err());
    }
}
