//! YAML loading with environment substitution
//!
//! Values tagged `!env_var NAME` are replaced by the content of the
//! environment variable, so credentials stay out of the config file:
//!
//! ```yaml
//! authentication:
//!   clientId: reporting
//!   clientSecret: !env_var API1_SECRET
//! ```

use crate::config::Config;
use crate::error::{ConfigError, ConfigResult};
use serde_yaml::Value;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, info, trace};

/// Overrides `baseline.storageDir`
pub const BASELINE_DIR_ENV: &str = "APIDRIFT_BASELINE_DIR";

/// Load, parse and validate a configuration file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    debug!("Loading configuration file: {:?}", path);

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config = parse(&content, path)?;
    config.apply_overrides(|key| env::var(key).ok());
    config.validate()?;

    info!(
        "Loaded configuration: testType={}, mode={}",
        config.test_type,
        config.comparison_mode.as_deref().unwrap_or("LIVE")
    );
    Ok(config)
}

/// Parse and validate configuration text
pub fn load_config_str(content: &str) -> ConfigResult<Config> {
    let mut config = parse(content, Path::new("<string>"))?;
    config.apply_overrides(|key| env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn parse(content: &str, source_path: &Path) -> ConfigResult<Config> {
    let parse_error = |e| ConfigError::ParseYaml {
        path: source_path.to_path_buf(),
        source: e,
    };

    let value: Value = serde_yaml::from_str(content).map_err(parse_error)?;
    let value = process_value(value)?;
    serde_yaml::from_value(value).map_err(parse_error)
}

fn process_value(value: Value) -> ConfigResult<Value> {
    match value {
        Value::Tagged(tagged) => process_tagged(*tagged),
        Value::Mapping(map) => {
            let mut result = serde_yaml::Mapping::new();
            for (k, v) in map {
                result.insert(process_value(k)?, process_value(v)?);
            }
            Ok(Value::Mapping(result))
        }
        Value::Sequence(seq) => {
            let result: ConfigResult<Vec<Value>> = seq.into_iter().map(process_value).collect();
            Ok(Value::Sequence(result?))
        }
        _ => Ok(value),
    }
}

fn process_tagged(tagged: serde_yaml::value::TaggedValue) -> ConfigResult<Value> {
    let tag = tagged.tag.to_string();
    trace!("Processing tag '{}' with value {:?}", tag, tagged.value);

    match tag.as_str() {
        "!env_var" => process_env_var(tagged.value),
        _ => Err(ConfigError::invalid(tag, "unsupported YAML tag")),
    }
}

fn process_env_var(value: Value) -> ConfigResult<Value> {
    let var_name = match value {
        Value::String(s) => s,
        _ => {
            return Err(ConfigError::invalid(
                "!env_var",
                "environment variable name must be a string",
            ))
        }
    };

    let env_value = env::var(&var_name).map_err(|_| ConfigError::EnvVarNotFound {
        var: var_name.clone(),
    })?;

    debug!("Substituted env var: {}", var_name);
    Ok(Value::String(env_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
testType: REST
rest:
  api1:
    baseUrl: http://localhost:8080
    operations:
      - name: health
        methods: [GET]
  api2:
    baseUrl: http://localhost:8081
    operations:
      - name: health
        methods: [GET]
"#;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_str(MINIMAL).unwrap();
        assert_eq!(config.test_type, "REST");
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn test_env_var_tag_is_substituted() {
        env::set_var("DRIFT_CONFIG_TEST_SECRET", "s3cret");
        let yaml = MINIMAL.replace(
            "    baseUrl: http://localhost:8080\n",
            "    baseUrl: http://localhost:8080\n    authentication:\n      clientId: me\n      clientSecret: !env_var DRIFT_CONFIG_TEST_SECRET\n",
        );

        let config = load_config_str(&yaml).unwrap();
        let auth = config.api1().unwrap().authentication.as_ref().unwrap();
        assert_eq!(auth.client_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_missing_env_var_is_error() {
        let yaml = MINIMAL.replace(
            "baseUrl: http://localhost:8081",
            "baseUrl: !env_var DRIFT_CONFIG_TEST_UNSET_VARIABLE",
        );
        let err = load_config_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { .. }));
    }

    #[test]
    fn test_unknown_tag_is_error() {
        let yaml = MINIMAL.replace("baseUrl: http://localhost:8081", "baseUrl: !secret api2");
        assert!(matches!(
            load_config_str(&yaml),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_error_carries_path() {
        let err = load_config_str("testType: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::ParseYaml { .. }));
        assert!(err.to_string().contains("<string>"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config("/definitely/not/here/config.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
