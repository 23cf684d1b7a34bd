//! Show-patterns command implementation
//!
//! Debug aid. The printed patterns embed the subject's identifiers, so the
//! output must be treated as identifiable data.

use super::{hasher_for, load_request};
use crate::config::load_config;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the show-patterns command
#[derive(Args, Debug)]
pub struct PatternsArgs {
    /// Scrub request (JSON)
    #[arg(short, long)]
    pub request: PathBuf,
}

impl PatternsArgs {
    /// Execute the show-patterns command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let hasher = hasher_for(&config);
        let scrubber = match load_request(&config, &self.request)
            .and_then(|request| request.build_scrubber(hasher))
        {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Invalid scrub request: {e}");
                return Ok(2);
            }
        };

        tracing::warn!("Printing pattern sources; output contains identifiers");
        eprintln!("⚠️  Pattern sources contain identifying values");

        println!("patient: {}", scrubber.get_patient_pattern_source());
        println!("third_party: {}", scrubber.get_third_party_pattern_source());
        if let Some(denylist) = scrubber.get_denylist_pattern_source() {
            println!("denylist: {denylist}");
        }
        Ok(0)
    }
}
