//! Configuration loading for apidrift
//!
//! A run is described by one YAML document: the test type, the two APIs and
//! their operations, the token candidates, the iteration strategy and, for
//! baseline runs, where captures are stored.
//!
//! # Example
//!
//! ```ignore
//! use drift_config::load_config;
//!
//! let config = load_config("config.yaml")?;
//! let tokens = config.token_spec()?;
//! let api1 = config.api1()?;
//! ```

mod config;
mod error;
mod loader;

pub use config::{
    ApiConfig, Authentication, BaselineConfig, BaselineOperation, ComparisonMode, Config,
    Operation,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, BASELINE_DIR_ENV};
