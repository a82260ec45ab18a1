//! Captured run records
//!
//! Field names are camelCase on disk so that runs captured by earlier tooling
//! load unchanged.

use drift_core::ApiKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Settings the run was captured with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    pub max_iterations: usize,
    pub iteration_controller: String,
    pub test_type: ApiKind,
}

/// Identifies one captured run. Written once, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    /// `run-NNN`
    pub run_id: String,
    pub service_name: String,
    /// `YYYYMMDD`
    pub capture_date: String,
    /// ISO-8601
    pub capture_timestamp: String,
    pub test_type: ApiKind,
    pub endpoint: String,
    pub operation: String,
    pub total_iterations: usize,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub config_used: CaptureSettings,
}

/// Request side metadata of a captured exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationMetadata {
    pub iteration_number: usize,
    pub timestamp: String,
    /// Token values as text, in assignment order
    #[serde(default)]
    pub tokens_used: IndexMap<String, String>,
    pub endpoint: String,
    pub method: String,
    #[serde(default)]
    pub soap_action: Option<String>,
    /// `{type, username}`; never holds a secret
    #[serde(default)]
    pub authentication: IndexMap<String, String>,
}

/// Response side metadata of a captured exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub status_code: u16,
    /// Milliseconds
    pub duration: u64,
    pub timestamp: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// One captured request/response exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineIteration {
    pub iteration_number: usize,
    pub request_payload: String,
    pub request_headers: IndexMap<String, String>,
    pub request_metadata: IterationMetadata,
    pub response_payload: String,
    pub response_headers: IndexMap<String, String>,
    pub response_metadata: ResponseMetadata,
}

/// A complete run as loaded from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRun {
    pub metadata: RunMetadata,
    /// Ordered by iteration number
    pub iterations: Vec<BaselineIteration>,
}

/// Listing entry for a stored run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub run_id: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub total_iterations: usize,
    pub timestamp: String,
}

impl From<&RunMetadata> for RunInfo {
    fn from(metadata: &RunMetadata) -> Self {
        Self {
            run_id: metadata.run_id.clone(),
            description: metadata.description.clone(),
            tags: metadata.tags.clone(),
            total_iterations: metadata.total_iterations,
            timestamp: metadata.capture_timestamp.clone(),
        }
    }
}

/// Content of `summary.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSummary {
    pub total_iterations: usize,
    pub iterations: Vec<IterationSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationSummary {
    pub iteration_number: usize,
    pub tokens: IndexMap<String, String>,
    pub status_code: u16,
    pub duration: u64,
}

impl CaptureSummary {
    pub fn from_iterations(iterations: &[BaselineIteration]) -> Self {
        Self {
            total_iterations: iterations.len(),
            iterations: iterations
                .iter()
                .map(|it| IterationSummary {
                    iteration_number: it.iteration_number,
                    tokens: it.request_metadata.tokens_used.clone(),
                    status_code: it.response_metadata.status_code,
                    duration: it.response_metadata.duration,
                })
                .collect(),
        }
    }
}
