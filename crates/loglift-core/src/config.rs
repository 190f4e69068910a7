// Engine configuration, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LogliftError, Result};
use crate::framework::{LoggingFramework, Severity, SeverityPolicy};

/// Settings for the `change-level` rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLevelConfig {
    pub from: Severity,
    pub to: Severity,
    /// Only calls whose message starts with this literal text.
    #[serde(default)]
    pub starts_with: Option<String>,
}

/// Core loglift configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogliftConfig {
    /// Framework every rewritten call should target
    pub target: LoggingFramework,
    /// Rules to run, by name
    pub rules: Vec<String>,
    /// Maximum fixed-point cycles per compilation unit
    pub max_cycles: usize,
    /// Name of an injected logger field
    pub logger_name: String,
    /// Inject a logger field when a class has none
    pub add_logger_if_missing: bool,
    /// Severity for `System.out` writes
    pub console_severity: Severity,
    pub severity_policy: SeverityPolicy,
    /// Turn `e.getMessage()` into `e` when `e` is already the trailing error
    pub collapse_error_accessors: bool,
    /// Drop `.toString()` from arguments when parameterizing
    pub strip_to_string: bool,
    /// Method pattern such as `org.slf4j.Logger info(..)` limiting parameterization
    pub method_pattern: Option<String>,
    pub change_level: Option<ChangeLevelConfig>,
}

impl Default for LogliftConfig {
    fn default() -> Self {
        Self {
            target: LoggingFramework::Slf4j,
            rules: vec![
                "system-print".to_string(),
                "migrate".to_string(),
                "parameterize-messages".to_string(),
            ],
            max_cycles: 10,
            logger_name: "logger".to_string(),
            add_logger_if_missing: true,
            console_severity: Severity::Info,
            severity_policy: SeverityPolicy::default(),
            collapse_error_accessors: false,
            strip_to_string: false,
            method_pattern: None,
            change_level: None,
        }
    }
}

impl LogliftConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cycles == 0 {
            return Err(LogliftError::Config("max_cycles must be at least 1".to_string()));
        }
        let valid_name = self.logger_name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
            && self.logger_name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if !valid_name {
            return Err(LogliftError::Config(format!(
                "logger_name {:?} is not a valid identifier",
                self.logger_name
            )));
        }
        Ok(())
    }
}
