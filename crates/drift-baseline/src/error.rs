//! Baseline store errors

use std::path::PathBuf;
use thiserror::Error;

/// Baseline store errors
#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Baseline not found: {service}/{date}/{run_id}")]
    NotFound {
        service: String,
        date: String,
        run_id: String,
    },

    #[error("Baseline already exists: {service}/{date}/{run_id}")]
    AlreadyExists {
        service: String,
        date: String,
        run_id: String,
    },

    #[error("No run id left after the highest existing run: {service}/{date}")]
    RunIdsExhausted { service: String, date: String },

    #[error("Iteration {number} appears more than once in one run")]
    DuplicateIteration { number: usize },

    #[error("Baseline file missing: {path:?}")]
    MissingFile { path: PathBuf },

    #[error("Invalid {what} name: {name:?}")]
    InvalidName { what: &'static str, name: String },
}

/// Result type for baseline operations
pub type BaselineResult<T> = Result<T, BaselineError>;
