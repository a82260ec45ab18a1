//! Report rows and run summary

use drift_compare::{ComparisonStatus, ComparisonVerdict, Difference};
use drift_core::IterationAssignment;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Format of [`ComparisonResult::timestamp`]
pub const RESULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One side of a comparison: what was sent and what came back
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallResult {
    pub url: String,
    pub method: String,
    pub request_headers: IndexMap<String, String>,
    pub request_payload: Option<String>,
    pub status_code: Option<u16>,
    pub response_headers: IndexMap<String, String>,
    pub response_payload: Option<String>,
    /// Milliseconds
    pub duration: u64,
    /// Why the payload template was sent unrendered, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_fallback: Option<String>,
}

/// Where a baseline-mode result came from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineInfo {
    pub baseline_service_name: String,
    pub baseline_date: String,
    pub baseline_run_id: String,
    pub baseline_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_description: Option<String>,
    pub baseline_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_capture_timestamp: Option<String>,
}

/// One row of the report: an operation executed for one iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub operation_name: String,
    pub iteration_tokens: IterationAssignment,
    pub status: ComparisonStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub differences: Vec<Difference>,
    pub timestamp: String,
    #[serde(flatten)]
    pub baseline: Option<BaselineInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api1: Option<ApiCallResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api2: Option<ApiCallResult>,
}

impl ComparisonResult {
    /// A result stamped with the current local time, status MATCH until set
    pub fn new(operation_name: impl Into<String>, iteration_tokens: IterationAssignment) -> Self {
        Self {
            operation_name: operation_name.into(),
            iteration_tokens,
            status: ComparisonStatus::Match,
            error_message: None,
            differences: Vec::new(),
            timestamp: chrono::Local::now()
                .format(RESULT_TIMESTAMP_FORMAT)
                .to_string(),
            baseline: None,
            api1: None,
            api2: None,
        }
    }

    pub fn apply_verdict(&mut self, verdict: ComparisonVerdict) {
        self.status = verdict.status;
        self.differences = verdict.differences;
        self.error_message = verdict.error;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ComparisonStatus::Error;
        self.error_message = Some(message.into());
        self.differences.clear();
    }

    pub fn is_error(&self) -> bool {
        self.status == ComparisonStatus::Error
    }
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn from_results(results: &[ComparisonResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                ComparisonStatus::Match => summary.matched += 1,
                ComparisonStatus::Mismatch => summary.mismatched += 1,
                ComparisonStatus::Error => summary.errored += 1,
            }
        }
        summary
    }

    /// True when no result is an ERROR
    pub fn is_clean(&self) -> bool {
        self.errored == 0
    }

    pub fn log(&self) {
        info!(
            "Comparison finished: {} total, {} matched, {} mismatched, {} errors",
            self.total, self.matched, self.mismatched, self.errored
        );
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Results: {}/{} matched, {} mismatched, {} errors",
            self.matched, self.total, self.mismatched, self.errored
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_compare::DiffKind;
    use drift_core::TokenValue;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let tokens = IterationAssignment::empty().with_value("id", TokenValue::Integer(7));
        let mut result = ComparisonResult::new("getAccount", tokens);
        result.apply_verdict(ComparisonVerdict::from_differences(vec![Difference::new(
            "$.name",
            DiffKind::ValueMismatch,
            "Values differ at $.name. API 1: a, API 2: b",
        )]));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["operationName"], "getAccount");
        assert_eq!(value["iterationTokens"], json!({"id": 7}));
        assert_eq!(value["status"], "MISMATCH");
        assert_eq!(value["differences"][0]["path"], "$.name");
        assert!(value.get("errorMessage").is_none());
        assert!(value.get("baselineRunId").is_none());
        assert!(value.get("api1").is_none());
        assert_eq!(value["timestamp"].as_str().unwrap().len(), 19);
    }

    #[test]
    fn test_baseline_fields_are_flattened() {
        let mut result = ComparisonResult::new("op", IterationAssignment::empty());
        result.baseline = Some(BaselineInfo {
            baseline_service_name: "svc".to_string(),
            baseline_date: "20260115".to_string(),
            baseline_run_id: "run-001".to_string(),
            baseline_path: "baselines/svc/20260115/run-001".to_string(),
            baseline_description: None,
            baseline_tags: vec!["v1".to_string()],
            baseline_capture_timestamp: None,
        });
        result.api1 = Some(ApiCallResult {
            status_code: Some(200),
            ..ApiCallResult::default()
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["baselineRunId"], "run-001");
        assert_eq!(value["baselineTags"], json!(["v1"]));
        assert_eq!(value["api1"]["statusCode"], 200);
    }

    #[test]
    fn test_fail_clears_differences() {
        let mut result = ComparisonResult::new("op", IterationAssignment::empty());
        result.differences.push(Difference::new("$", DiffKind::ValueMismatch, "x"));
        result.fail("Operation failed: timeout");

        assert!(result.is_error());
        assert!(result.differences.is_empty());
        assert_eq!(result.error_message.as_deref(), Some("Operation failed: timeout"));
    }

    #[test]
    fn test_summary_counts() {
        let mut results = vec![
            ComparisonResult::new("a", IterationAssignment::empty()),
            ComparisonResult::new("b", IterationAssignment::empty()),
            ComparisonResult::new("c", IterationAssignment::empty()),
        ];
        results[1].status = ComparisonStatus::Mismatch;
        results[2].fail("boom");

        let summary = RunSummary::from_results(&results);
        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                matched: 1,
                mismatched: 1,
                errored: 1
            }
        );
        assert!(!summary.is_clean());
        assert_eq!(summary.to_string(), "Results: 1/3 matched, 1 mismatched, 1 errors");
    }
}
