//! Validate config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let scrubber = &config.scrubber;
        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Workers: {}", config.application.workers);
        println!(
            "  String Max Errors: {} (min length {})",
            scrubber.string_max_regex_errors, scrubber.min_string_length_for_errors
        );
        println!(
            "  Min String Length: {}",
            scrubber.min_string_length_to_scrub_with
        );
        println!(
            "  Numbers Of N Digits: {:?}",
            scrubber.scrub_all_numbers_of_n_digits
        );
        println!("  UK Postcodes: {}", scrubber.scrub_all_uk_postcodes);
        println!(
            "  All Dates: {}{}",
            scrubber.scrub_all_dates,
            scrubber
                .replace_all_dates_with
                .as_deref()
                .map(|t| format!(" (blurred as \"{t}\")"))
                .unwrap_or_default()
        );
        println!(
            "  Audit: {}",
            if config.audit.enabled {
                config.audit.log_path.as_str()
            } else {
                "disabled"
            }
        );
        println!();
        Ok(0)
    }
}
