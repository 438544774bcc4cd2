//! Command-line front end
//!
//! - `args` - clap definitions
//! - `render` - spinner and summary output

pub mod args;
pub mod render;

pub use args::{Cli, Commands};

use anyhow::{Context, Result};
use tracing::debug;

use crate::client::TriageClient;
use crate::config::TriageConfig;
use crate::progress::ProgressReporter;
use crate::run::run_assessment;
use crate::server::TriageServer;

/// Resolve configuration from file, environment and flags.
pub fn resolve_config(cli: &Cli, limit: Option<u32>) -> Result<TriageConfig> {
    let mut config =
        TriageConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(cli.api_key.clone(), cli.base_url.clone(), limit);
    config.validate()?;
    debug!("Using base URL {}", config.base_url()?);
    Ok(config)
}

pub async fn execute(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Run {
            submit,
            json,
            limit,
        } => {
            let client = TriageClient::from_config(resolve_config(&cli, *limit)?)?;
            run_command(&client, *submit, *json).await
        }
        Commands::Fetch { limit } => {
            let client = TriageClient::from_config(resolve_config(&cli, *limit)?)?;
            fetch_command(&client).await
        }
        Commands::Serve { port } => {
            let client = TriageClient::from_config(resolve_config(&cli, None)?)?;
            TriageServer::new(client, *port).start().await
        }
    }
}

async fn run_command(client: &TriageClient, submit: bool, json: bool) -> Result<()> {
    debug!("Running assessment with page limit {}", client.config().page_limit);
    let progress = ProgressReporter::new();
    let spinner = (!json).then(|| render::spawn_spinner(progress.subscribe()));

    let outcome = run_assessment(client, submit, &progress).await;
    drop(progress);
    if let Some(handle) = spinner {
        let _ = handle.await;
    }

    let report = outcome.context("Assessment run failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::print_summary(&report);
    }
    Ok(())
}

async fn fetch_command(client: &TriageClient) -> Result<()> {
    let progress = ProgressReporter::new();
    let spinner = render::spawn_spinner(progress.subscribe());

    let outcome = client.fetch_all_patients(&progress).await;
    drop(progress);
    let _ = spinner.await;

    let patients = outcome.context("Patient retrieval failed")?;
    println!("{}", serde_json::to_string_pretty(&patients)?);
    Ok(())
}
