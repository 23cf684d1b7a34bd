//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the anonymiser using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Anonymiser - identifier scrubbing for clinical free text
#[derive(Parser, Debug)]
#[command(name = "anonymiser")]
#[command(version, about, long_about = None)]
#[command(author = "Anonymiser Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "anonymiser.toml", env = "ANONYMISER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ANONYMISER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrub text files (or stdin) for one subject
    Scrub(commands::scrub::ScrubArgs),

    /// Print the configuration hash of a request's scrubber
    Hash(commands::hash::HashArgs),

    /// Print the compiled pattern sources (contains identifiers)
    ShowPatterns(commands::patterns::PatternsArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parse_scrub() {
        let cli = Cli::parse_from([
            "anonymiser",
            "scrub",
            "--request",
            "subject.json",
            "a.txt",
            "b.txt",
        ]);
        assert_eq!(cli.config, "anonymiser.toml");
        let Commands::Scrub(args) = cli.command else {
            panic!("expected scrub command");
        };
        assert_eq!(args.request, PathBuf::from("subject.json"));
        assert_eq!(args.files.len(), 2);
        assert!(args.workers.is_none());
    }

    #[test]
    fn test_cli_parse_scrub_options() {
        let cli = Cli::parse_from([
            "anonymiser",
            "scrub",
            "-r",
            "subject.json",
            "--output-dir",
            "out",
            "--workers",
            "8",
        ]);
        let Commands::Scrub(args) = cli.command else {
            panic!("expected scrub command");
        };
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.workers, Some(8));
        assert!(args.files.is_empty());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["anonymiser", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["anonymiser", "--log-level", "debug", "hash", "-r", "x.json"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Hash(_)));
    }

    #[test]
    fn test_cli_parse_show_patterns() {
        let cli = Cli::parse_from(["anonymiser", "show-patterns", "--request", "x.json"]);
        assert!(matches!(cli.command, Commands::ShowPatterns(_)));
    }
}
