//! CLI module for qtheory.
//!
//! All CLI logic lives here rather than in main.rs so it can be tested. The
//! entry point `run_cli` is called from main.rs with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::{
    evaluate_file, evaluate_scenarios, run_cli, run_scenarios, ReportStatus, ScenarioReport,
};
pub use output::{
    format_json, format_models, format_report, print_help, print_models, print_version,
    version_string,
};
