//! Comparison runner for apidrift
//!
//! Ties the pieces together: plans iterations from the configured tokens,
//! renders payloads, calls the APIs through a [`drift_client::Transport`],
//! compares responses and, in baseline mode, captures to or replays from a
//! [`drift_baseline::BaselineRepository`].
//!
//! Three kinds of run exist:
//!
//! - `LIVE` - api1 and api2 are called with the same payload and compared
//! - `BASELINE` / `CAPTURE` - api1 responses are stored as a new run
//! - `BASELINE` / `COMPARE` - a stored run is replayed against api1
//!
//! # Example
//!
//! ```ignore
//! use drift_runner::{write_json_report, Orchestrator, RunSummary};
//!
//! let orchestrator = Orchestrator::from_config(drift_config::load_config("config.yaml")?)?;
//! let results = orchestrator.run().await;
//! write_json_report(&results, "results.json").await?;
//! println!("{}", RunSummary::from_results(&results));
//! ```

mod error;
mod orchestrator;
mod plan;
mod report;
mod result;
mod url;

pub use error::{RunnerError, RunnerResult};
pub use orchestrator::Orchestrator;
pub use plan::{operation_label, plan_iterations};
pub use report::write_json_report;
pub use result::{
    ApiCallResult, BaselineInfo, ComparisonResult, RunSummary, RESULT_TIMESTAMP_FORMAT,
};
pub use url::construct_url;
