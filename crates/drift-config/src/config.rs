//! Configuration document
//!
//! Keys are camelCase. Mode and strategy names are kept as written and
//! parsed by the accessor methods, so a typo is reported by
//! [`Config::validate`] with the offending key instead of as a YAML error.

use crate::error::{ConfigError, ConfigResult};
use crate::loader::BASELINE_DIR_ENV;
use drift_core::{ApiKind, TokenSpec, TokenValue};
use drift_iteration::IterationStrategy;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Whether api2 is a live API or a stored baseline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComparisonMode {
    #[default]
    Live,
    Baseline,
}

impl FromStr for ComparisonMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIVE" => Ok(ComparisonMode::Live),
            "BASELINE" => Ok(ComparisonMode::Baseline),
            _ => Err(ConfigError::invalid(
                "comparisonMode",
                format!("'{}', expected LIVE or BASELINE", s),
            )),
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonMode::Live => write!(f, "LIVE"),
            ComparisonMode::Baseline => write!(f, "BASELINE"),
        }
    }
}

/// What a BASELINE run does with the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineOperation {
    Capture,
    Compare,
}

impl FromStr for BaselineOperation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAPTURE" => Ok(BaselineOperation::Capture),
            "COMPARE" => Ok(BaselineOperation::Compare),
            _ => Err(ConfigError::invalid(
                "baseline.operation",
                format!("'{}', expected CAPTURE or COMPARE", s),
            )),
        }
    }
}

/// Credentials for one API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    /// OAuth token endpoint; without it `clientId`/`clientSecret` are used for basic auth
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// One callable operation of an API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Template file path or inline template text
    #[serde(default)]
    pub payload_template_path: Option<String>,
}

/// `api1` / `api2` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub authentication: Option<Authentication>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl ApiConfig {
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

fn default_storage_dir() -> String {
    "baselines".to_string()
}

/// `baseline` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineConfig {
    pub operation: String,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `YYYYMMDD` of the run to compare against
    #[serde(default)]
    pub compare_date: Option<String>,
    #[serde(default)]
    pub compare_run_id: Option<String>,
}

impl BaselineConfig {
    pub fn operation(&self) -> ConfigResult<BaselineOperation> {
        self.operation.parse()
    }
}

fn default_max_iterations() -> usize {
    100
}

/// Complete configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// REST or SOAP
    pub test_type: String,
    #[serde(default)]
    pub rest: Option<IndexMap<String, ApiConfig>>,
    #[serde(default)]
    pub soap: Option<IndexMap<String, ApiConfig>>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Token name to candidate values, in file order
    #[serde(default)]
    pub tokens: IndexMap<String, Vec<Value>>,
    #[serde(default)]
    pub iteration_controller: Option<String>,
    #[serde(default)]
    pub comparison_mode: Option<String>,
    #[serde(default)]
    pub baseline: Option<BaselineConfig>,
}

impl Config {
    pub fn api_kind(&self) -> ConfigResult<ApiKind> {
        self.test_type
            .parse()
            .map_err(|e| ConfigError::invalid("testType", format!("{}", e)))
    }

    pub fn strategy(&self) -> ConfigResult<IterationStrategy> {
        match self.iteration_controller.as_deref() {
            None => Ok(IterationStrategy::default()),
            Some(name) => name
                .parse()
                .map_err(|e| ConfigError::invalid("iterationController", format!("{}", e))),
        }
    }

    pub fn mode(&self) -> ConfigResult<ComparisonMode> {
        match self.comparison_mode.as_deref() {
            None => Ok(ComparisonMode::default()),
            Some(mode) => mode.parse(),
        }
    }

    /// The `rest` or `soap` section, by test type
    pub fn apis(&self) -> ConfigResult<&IndexMap<String, ApiConfig>> {
        let kind = self.api_kind()?;
        let section = match kind {
            ApiKind::Rest => self.rest.as_ref(),
            ApiKind::Soap => self.soap.as_ref(),
        };
        section.ok_or_else(|| {
            ConfigError::validation(format!(
                "no '{}' section for test type {}",
                kind.as_str().to_ascii_lowercase(),
                kind
            ))
        })
    }

    pub fn api1(&self) -> ConfigResult<&ApiConfig> {
        self.api("api1")
    }

    pub fn api2(&self) -> ConfigResult<&ApiConfig> {
        self.api("api2")
    }

    fn api(&self, name: &str) -> ConfigResult<&ApiConfig> {
        let kind = self.api_kind()?;
        self.apis()?.get(name).ok_or_else(|| {
            ConfigError::validation(format!(
                "'{}' is not defined under '{}'",
                name,
                kind.as_str().to_ascii_lowercase()
            ))
        })
    }

    /// Candidate values as typed scalars
    pub fn token_spec(&self) -> ConfigResult<TokenSpec> {
        let mut spec = TokenSpec::new();
        for (name, values) in &self.tokens {
            if values.is_empty() {
                return Err(ConfigError::invalid(
                    format!("tokens.{}", name),
                    "candidate list is empty",
                ));
            }
            let values = values
                .iter()
                .map(|value| scalar(name, value))
                .collect::<ConfigResult<Vec<_>>>()?;
            spec.insert(name.clone(), values);
        }
        Ok(spec)
    }

    /// Apply environment overrides; `lookup` returns a variable's value
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(BASELINE_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            if let Some(baseline) = self.baseline.as_mut() {
                debug!("Baseline storage directory overridden by {}: {}", BASELINE_DIR_ENV, dir);
                baseline.storage_dir = dir;
            }
        }
    }

    /// Reject configurations the runner cannot execute
    pub fn validate(&self) -> ConfigResult<()> {
        self.api_kind()?;
        self.strategy()?;
        let mode = self.mode()?;

        if self.max_iterations == 0 {
            return Err(ConfigError::invalid("maxIterations", "must be at least 1"));
        }
        self.token_spec()?;

        validate_api("api1", self.api1()?)?;
        if mode == ComparisonMode::Live {
            validate_api("api2", self.api2()?)?;
        }

        if mode == ComparisonMode::Baseline {
            let baseline = self.baseline.as_ref().ok_or_else(|| {
                ConfigError::validation("comparisonMode BASELINE requires a 'baseline' section")
            })?;
            if is_blank(baseline.service_name.as_deref()) {
                return Err(ConfigError::invalid(
                    "baseline.serviceName",
                    "required in BASELINE mode",
                ));
            }
            if baseline.storage_dir.trim().is_empty() {
                return Err(ConfigError::invalid("baseline.storageDir", "must not be empty"));
            }
            if baseline.operation()? == BaselineOperation::Compare {
                if is_blank(baseline.compare_date.as_deref()) {
                    return Err(ConfigError::invalid(
                        "baseline.compareDate",
                        "required for COMPARE",
                    ));
                }
                if is_blank(baseline.compare_run_id.as_deref()) {
                    return Err(ConfigError::invalid(
                        "baseline.compareRunId",
                        "required for COMPARE",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn validate_api(name: &str, api: &ApiConfig) -> ConfigResult<()> {
    if api.base_url.trim().is_empty() {
        return Err(ConfigError::invalid(format!("{}.baseUrl", name), "must not be empty"));
    }
    if api.operations.is_empty() {
        return Err(ConfigError::validation(format!("{} has no operations", name)));
    }
    for op in &api.operations {
        if op.name.trim().is_empty() {
            return Err(ConfigError::invalid(
                format!("{}.operations", name),
                "operation without a name",
            ));
        }
        if op.methods.is_empty() {
            return Err(ConfigError::invalid(
                format!("{}.operations.{}.methods", name, op.name),
                "at least one method is required",
            ));
        }
        if let Some(method) = op
            .methods
            .iter()
            .find(|m| !HTTP_METHODS.contains(&m.to_ascii_uppercase().as_str()))
        {
            return Err(ConfigError::invalid(
                format!("{}.operations.{}.methods", name, op.name),
                format!("unknown HTTP method '{}'", method),
            ));
        }
    }
    Ok(())
}

fn scalar(token: &str, value: &Value) -> ConfigResult<TokenValue> {
    match value {
        Value::Bool(b) => Ok(TokenValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(TokenValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(TokenValue::Float(f))
            } else {
                Err(ConfigError::invalid(
                    format!("tokens.{}", token),
                    format!("number {} is out of range", n),
                ))
            }
        }
        Value::String(s) => Ok(TokenValue::Text(s.clone())),
        other => Err(ConfigError::invalid(
            format!("tokens.{}", token),
            format!("candidate values must be scalars, found {:?}", other),
        )),
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
