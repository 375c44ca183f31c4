//! Configuration and scenario files.
//!
//! A scenario file pairs solver settings with a list of named parameter
//! records:
//!
//! ```yaml
//! schema_version: "1.0"
//! config:
//!   precision:
//!     significant_digits: 12
//!   logging:
//!     level: debug
//! scenarios:
//!   - name: checkout
//!     parameters:
//!       model: mms
//!       lambda: 4
//!       mu: 2
//!       servers: 3
//! ```
//!
//! Loading runs three layers of checks: serde's schema (unknown fields are
//! rejected), `validator` range rules, then semantic rules that span fields.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{QueueError, QueueResult};
use crate::models::Parameters;
use crate::precision::{Precision, MAX_SIGNIFICANT_DIGITS};

/// Solver settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SolverConfig {
    /// Precision of reported values.
    #[validate(nested)]
    #[serde(default)]
    pub precision: PrecisionConfig,

    /// Log output.
    #[validate(nested)]
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SolverConfig {
    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> QueueResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> QueueResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a builder for settings.
    #[must_use]
    pub fn builder() -> SolverConfigBuilder {
        SolverConfigBuilder::default()
    }

    /// Precision context for evaluators.
    #[must_use]
    pub fn precision(&self) -> Precision {
        Precision::new(
            self.precision.significant_digits,
            self.precision.tolerance_digits,
        )
    }
}

/// Builder for programmatic settings.
#[derive(Debug, Default)]
pub struct SolverConfigBuilder {
    significant_digits: Option<u32>,
    tolerance_digits: Option<u32>,
    log_level: Option<String>,
}

impl SolverConfigBuilder {
    /// Set the significant digits of reported values.
    #[must_use]
    pub const fn significant_digits(mut self, digits: u32) -> Self {
        self.significant_digits = Some(digits);
        self
    }

    /// Set the negligibility threshold exponent.
    #[must_use]
    pub const fn tolerance_digits(mut self, digits: u32) -> Self {
        self.tolerance_digits = Some(digits);
        self
    }

    /// Set the log level filter.
    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Build the settings.
    #[must_use]
    pub fn build(self) -> SolverConfig {
        let mut config = SolverConfig::default();

        if let Some(digits) = self.significant_digits {
            config.precision.significant_digits = digits;
        }

        if let Some(digits) = self.tolerance_digits {
            config.precision.tolerance_digits = digits;
        }

        if let Some(level) = self.log_level {
            config.logging.level = level;
        }

        config
    }
}

/// Precision settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PrecisionConfig {
    /// Significant digits carried into reported values.
    #[validate(range(min = 1, max = 28))]
    #[serde(default = "default_significant_digits")]
    pub significant_digits: u32,

    /// `ε = 10^-tolerance_digits` below which a quantity counts as zero.
    #[validate(range(min = 1, max = 28))]
    #[serde(default = "default_tolerance_digits")]
    pub tolerance_digits: u32,
}

const fn default_significant_digits() -> u32 {
    MAX_SIGNIFICANT_DIGITS
}

const fn default_tolerance_digits() -> u32 {
    20
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            significant_digits: default_significant_digits(),
            tolerance_digits: default_tolerance_digits(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[validate(length(min = 1))]
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Scenario files
// =============================================================================

/// A named parameter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Unique name within the file.
    #[validate(length(min = 1))]
    pub name: String,

    /// Model parameters, tagged by `model`.
    pub parameters: Parameters,
}

/// A scenario file: solver settings plus scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Solver settings.
    #[validate(nested)]
    #[serde(default)]
    pub config: SolverConfig,

    /// Scenarios to evaluate, in order.
    #[validate(nested)]
    pub scenarios: Vec<Scenario>,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl ScenarioFile {
    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> QueueResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a scenario file from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> QueueResult<Self> {
        let file: Self = serde_yaml::from_str(yaml)?;
        file.validate()?;
        file.validate_semantic()?;
        Ok(file)
    }

    /// Serialize back to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> QueueResult<String> {
        serde_yaml::to_string(self).map_err(|e| QueueError::serialization(e.to_string()))
    }

    fn validate_semantic(&self) -> QueueResult<()> {
        if self.scenarios.is_empty() {
            return Err(QueueError::config("scenario file contains no scenarios"));
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(QueueError::config(format!(
                    "duplicate scenario name: {}",
                    scenario.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::single_server::Mm1;
    use crate::models::ModelKind;

    const SAMPLE: &str = r"
schema_version: '1.0'
config:
  precision:
    significant_digits: 12
scenarios:
  - name: web
    parameters:
      model: mm1
      lambda: 2
      mu: 5
  - name: call-center
    parameters:
      model: mms
      arrival_rate: 4
      service_rate: 2
      servers: 3
      time: 0.5
  - name: triage
    parameters:
      model: priority-non-preemptive
      arrival_rates: [1, 1]
      mu: 4
";

    #[test]
    fn test_config_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.precision.significant_digits, 28);
        assert_eq!(config.precision.tolerance_digits, 20);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.precision(), Precision::default());
    }

    #[test]
    fn test_builder() {
        let config = SolverConfig::builder()
            .significant_digits(10)
            .tolerance_digits(8)
            .log_level("debug")
            .build();
        assert_eq!(config.precision.significant_digits, 10);
        assert_eq!(config.precision().tolerance_digits(), 8);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_solver_config_from_yaml() {
        let config = SolverConfig::from_yaml("logging:\n  level: warn\n").expect("valid");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.precision.significant_digits, 28);
    }

    #[test]
    fn test_solver_config_rejects_out_of_range_digits() {
        let result = SolverConfig::from_yaml("precision:\n  significant_digits: 40\n");
        assert!(matches!(result, Err(QueueError::Validation(_))));
    }

    #[test]
    fn test_solver_config_rejects_unknown_fields() {
        let result = SolverConfig::from_yaml("seed: 42\n");
        assert!(matches!(result, Err(QueueError::YamlParse(_))));
    }

    #[test]
    fn test_scenario_file_parses() {
        let file = ScenarioFile::from_yaml(SAMPLE).expect("valid");
        assert_eq!(file.scenarios.len(), 3);
        assert_eq!(file.config.precision.significant_digits, 12);
        assert_eq!(file.scenarios[0].parameters, Parameters::Mm1(Mm1::new(2.0, 5.0)));
        assert_eq!(file.scenarios[1].parameters.kind(), ModelKind::Mms);
        assert_eq!(
            file.scenarios[2].parameters.kind(),
            ModelKind::PriorityNonPreemptive
        );
    }

    #[test]
    fn test_scenario_file_yaml_round_trip() {
        let file = ScenarioFile::from_yaml(SAMPLE).expect("valid");
        let yaml = file.to_yaml().expect("serialize");
        let again = ScenarioFile::from_yaml(&yaml).expect("reparse");
        assert_eq!(file, again);
    }

    #[test]
    fn test_scenario_file_rejects_empty() {
        let result = ScenarioFile::from_yaml("scenarios: []\n");
        assert!(matches!(result, Err(QueueError::Config { .. })));
    }

    #[test]
    fn test_scenario_file_rejects_duplicate_names() {
        let yaml = r"
scenarios:
  - name: a
    parameters: { model: mm1, lambda: 1, mu: 2 }
  - name: a
    parameters: { model: mm1, lambda: 1, mu: 3 }
";
        let err = ScenarioFile::from_yaml(yaml).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate scenario name: a"));
    }

    #[test]
    fn test_scenario_file_rejects_empty_name() {
        let yaml = "scenarios:\n  - name: ''\n    parameters: { model: mm1, lambda: 1, mu: 2 }\n";
        assert!(matches!(
            ScenarioFile::from_yaml(yaml),
            Err(QueueError::Validation(_))
        ));
    }

    #[test]
    fn test_scenario_file_rejects_unknown_model() {
        let yaml = "scenarios:\n  - name: x\n    parameters: { model: gg1, lambda: 1, mu: 2 }\n";
        assert!(matches!(
            ScenarioFile::from_yaml(yaml),
            Err(QueueError::YamlParse(_))
        ));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let result = ScenarioFile::load("/nonexistent/qtheory/scenarios.yaml");
        assert!(matches!(result, Err(QueueError::Io(_))));
    }
}
