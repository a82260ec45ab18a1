//! apidrift
//!
//! Loads a configuration, runs it and writes the JSON report. Exits with 0
//! when no result is an ERROR, 1 otherwise and 2 when the configuration
//! cannot be used.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use drift_compare::ComparisonStatus;
use drift_runner::{write_json_report, ComparisonResult, Orchestrator, RunSummary};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const EXIT_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("error: {:#}", e);
        return ExitCode::from(EXIT_CONFIG);
    }

    let orchestrator = match prepare(&cli) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(&cli, &orchestrator).await {
        Ok(summary) if summary.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_FAILED),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{}'", level))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn prepare(cli: &Cli) -> Result<Orchestrator> {
    let config = drift_config::load_config(&cli.config)
        .with_context(|| format!("failed to load {:?}", cli.config))?;
    Orchestrator::from_config(config).context("failed to prepare comparison run")
}

async fn run(cli: &Cli, orchestrator: &Orchestrator) -> Result<RunSummary> {
    let results = orchestrator.run().await;
    write_json_report(&results, &cli.output).await?;

    print_results(&results);
    let summary = RunSummary::from_results(&results);
    println!();
    println!("{}", summary);
    info!("Report written to {:?}", cli.output);
    Ok(summary)
}

fn print_results(results: &[ComparisonResult]) {
    println!("\n=== Comparison Summary ===");
    for result in results {
        let marker = match result.status {
            ComparisonStatus::Match => "✓",
            ComparisonStatus::Mismatch => "✗",
            ComparisonStatus::Error => "!",
        };
        println!(
            "{} {} {} {}",
            marker, result.status, result.operation_name, result.iteration_tokens
        );
        if let Some(message) = &result.error_message {
            println!("    {}", message);
        }
        for difference in &result.differences {
            println!("    - {}", difference.detail);
        }
    }
}
