//! Runner errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run before any iteration executes, or while writing
/// the report. Failures inside a run become ERROR results instead.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(#[from] drift_config::ConfigError),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] drift_client::TransportError),

    #[error("Baseline error: {0}")]
    Baseline(#[from] drift_baseline::BaselineError),

    #[error("No transport configured for {0}")]
    MissingTransport(&'static str),

    #[error("Baseline mode requires a baseline store")]
    MissingStore,

    #[error("Failed to write report {path:?}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;
