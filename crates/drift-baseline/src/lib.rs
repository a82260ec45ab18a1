//! Baseline storage for apidrift
//!
//! A baseline is a captured run of request/response exchanges that later
//! runs are compared against in place of a second live API. Runs are
//! addressed by `(service, date, run_id)` and never modified after capture.
//!
//! [`BaselineRepository`] is the storage seam; [`FileBaselineStore`] keeps
//! runs in a directory tree.

mod error;
mod model;
mod store;

pub use error::{BaselineError, BaselineResult};
pub use model::{
    BaselineIteration, BaselineRun, CaptureSettings, CaptureSummary, IterationMetadata,
    IterationSummary, ResponseMetadata, RunInfo, RunMetadata,
};
pub use store::FileBaselineStore;

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

/// Format of capture dates, `YYYYMMDD`
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Today's date in local time, formatted as a capture date
pub fn today() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

/// Persistence for captured runs
///
/// Readers may run concurrently with anything. A writer holds
/// [`lock_captures`](Self::lock_captures) for its service and date from
/// `generate_run_id` until `save` returns.
#[async_trait]
pub trait BaselineRepository: Send + Sync {
    /// Serialize run id allocation and saving for one service and date
    async fn lock_captures(&self, service: &str, date: &str) -> OwnedMutexGuard<()>;

    /// Next free `run-NNN` for a service and date, `run-001` if none exist
    async fn generate_run_id(&self, service: &str, date: &str) -> BaselineResult<String>;

    /// Store a new run; fails if the run already exists or two iterations share a number
    async fn save(&self, metadata: &RunMetadata, iterations: &[BaselineIteration])
        -> BaselineResult<()>;

    /// Load a run with its iterations in order
    async fn load(&self, service: &str, date: &str, run_id: &str) -> BaselineResult<BaselineRun>;

    /// Services with at least one directory, sorted
    async fn list_services(&self) -> BaselineResult<Vec<String>>;

    /// Capture dates for a service, most recent first
    async fn list_dates(&self, service: &str) -> BaselineResult<Vec<String>>;

    /// Runs for a service and date, sorted by run id
    async fn list_runs(&self, service: &str, date: &str) -> BaselineResult<Vec<RunInfo>>;

    /// Human readable location of a run, for reports
    fn location(&self, service: &str, date: &str, run_id: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_is_eight_digits() {
        let date = today();
        assert_eq!(date.len(), 8);
        assert!(date.chars().all(|c| c.is_ascii_digit()));
    }
}
