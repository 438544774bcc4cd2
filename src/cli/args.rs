//! CLI argument structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fetch patient records, score their risk, and submit cohort assessments
#[derive(Parser)]
#[command(name = "patient-triage")]
#[command(about = "patient-triage - Score patient vital-sign risk and submit cohort assessments", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// API key for the patient service (overrides TRIAGE_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the patient service (overrides TRIAGE_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all patients, assess risk and print the cohorts
    Run {
        /// Submit the cohorts for scoring after assessment
        #[arg(long)]
        submit: bool,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Records requested per page
        #[arg(short = 'l', long)]
        limit: Option<u32>,
    },

    /// Fetch all patients and print them as JSON
    Fetch {
        /// Records requested per page
        #[arg(short = 'l', long)]
        limit: Option<u32>,
    },

    /// Serve the forwarding endpoints over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_globals() {
        let cli = Cli::try_parse_from([
            "patient-triage",
            "-vv",
            "run",
            "--submit",
            "--limit",
            "5",
            "--api-key",
            "ak_cli",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.api_key.as_deref(), Some("ak_cli"));
        match cli.command {
            Commands::Run {
                submit,
                json,
                limit,
            } => {
                assert!(submit);
                assert!(!json);
                assert_eq!(limit, Some(5));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_serve_default_port() {
        let cli = Cli::try_parse_from(["patient-triage", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: 8080 }));
    }
}
