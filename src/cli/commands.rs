//! CLI command handlers.
//!
//! Scenario evaluation is split from printing so the command layer can be
//! exercised directly in tests.

use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;
use tracing::info;

use super::output::{format_json, format_report, print_help, print_models, print_version};
use super::{Args, Command};
use crate::config::ScenarioFile;
use crate::error::QueueResult;
use crate::logging::init_logging;
use crate::metrics::Evaluation;
use crate::models::{ModelKind, Results};

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Model evaluated.
    pub model: ModelKind,
    /// Evaluation status.
    #[serde(flatten)]
    pub status: ReportStatus,
}

impl ScenarioReport {
    /// Whether the parameters were rejected.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self.status, ReportStatus::Invalid { .. })
    }
}

/// Status of a scenario, mirroring `Stable | Unstable | Invalid`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReportStatus {
    /// Steady state exists.
    Stable {
        /// Results record.
        results: Results,
    },
    /// Some metrics are unbounded.
    Unstable {
        /// Results record with `∞` where unbounded.
        results: Results,
    },
    /// Parameters were rejected.
    Invalid {
        /// Why the parameters were rejected.
        error: String,
    },
}

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run {
            scenario_path,
            json,
            verbose,
        } => run_scenarios(&scenario_path, json, verbose),
        Command::Models => {
            print_models();
            ExitCode::SUCCESS
        }
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

/// Evaluate a scenario file and print the report.
///
/// Exits with 1 if the file cannot be loaded or any scenario is invalid.
#[must_use]
pub fn run_scenarios(path: &Path, json: bool, verbose: bool) -> ExitCode {
    let file = match ScenarioFile::load(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    let level = if verbose {
        "debug"
    } else {
        file.config.logging.level.as_str()
    };
    init_logging(level);

    let reports = evaluate_scenarios(&file);
    if json {
        match format_json(&reports) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(1);
            }
        }
    } else {
        println!("Scenarios: {}\n", path.display());
        print!("{}", format_report(&reports, verbose));
    }

    if reports.iter().any(ScenarioReport::is_invalid) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Evaluate every scenario with the file's precision settings.
#[must_use]
pub fn evaluate_scenarios(file: &ScenarioFile) -> Vec<ScenarioReport> {
    let precision = file.config.precision();
    file.scenarios
        .iter()
        .map(|scenario| {
            let model = scenario.parameters.kind();
            info!(scenario = %scenario.name, model = model.notation(), "evaluating scenario");
            let status = match scenario.parameters.evaluate(&precision) {
                Ok(Evaluation::Stable(results)) => ReportStatus::Stable { results },
                Ok(Evaluation::Unstable(results)) => ReportStatus::Unstable { results },
                Err(e) => ReportStatus::Invalid {
                    error: e.to_string(),
                },
            };
            ScenarioReport {
                name: scenario.name.clone(),
                model,
                status,
            }
        })
        .collect()
}

/// Load and evaluate a scenario file without printing.
///
/// # Errors
///
/// Returns error if the file cannot be read, parsed, or validated.
pub fn evaluate_file(path: &Path) -> QueueResult<Vec<ScenarioReport>> {
    let file = ScenarioFile::load(path)?;
    Ok(evaluate_scenarios(&file))
}
