//! CLI output formatting.
//!
//! Formatting returns strings; the `print_*` wrappers write them to stdout.

use std::fmt::Write as _;

use serde_json::Value;

use super::commands::{ReportStatus, ScenarioReport};
use crate::error::{QueueError, QueueResult};
use crate::models::{ModelKind, Results};

/// Sequences longer than this are elided unless verbose.
const SHORT_SEQUENCE: usize = 8;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Version line, with the git revision when the build recorded one.
#[must_use]
pub fn version_string() -> String {
    let version = option_env!("QTHEORY_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => {
            format!("qtheory {version} ({})", hash.get(..12).unwrap_or(hash))
        }
        _ => format!("qtheory {version}"),
    }
}

/// Print version information.
pub fn print_version() {
    println!("{}", version_string());
}

/// Print help message.
pub fn print_help() {
    println!(
        r"qtheory - steady-state solvers for queueing models

USAGE:
    qtheory <COMMAND> [OPTIONS]

COMMANDS:
    run <scenarios.yaml>        Evaluate every scenario in a file
        --json                  Emit JSON instead of a text report
        -v, --verbose           Show full occupancy lists and debug logs

    models                      List supported models

    help                        Show this help message
    version                     Show version information

EXAMPLES:
    qtheory run scenarios.yaml
    qtheory run scenarios.yaml --json
    RUST_LOG=qtheory=trace qtheory run scenarios.yaml

EXIT STATUS:
    0 when every scenario evaluates (stable or unstable),
    1 when the file is unreadable or any scenario is invalid.
"
    );
}

/// Table of supported models.
#[must_use]
pub fn format_models() -> String {
    let mut out = String::from("Supported models:\n\n");
    for kind in ModelKind::ALL {
        let _ = writeln!(
            out,
            "  {:<24} {:<12} {}",
            kind.tag(),
            kind.notation(),
            kind.description()
        );
    }
    out.push_str("\nSelect one with `model: <tag>` in a scenario's parameters.\n");
    out
}

/// Print the table of supported models.
pub fn print_models() {
    print!("{}", format_models());
}

/// Render reports as pretty JSON.
///
/// Unbounded metrics serialize as `null`.
///
/// # Errors
///
/// Returns a serialization error if encoding fails.
pub fn format_json(reports: &[ScenarioReport]) -> QueueResult<String> {
    serde_json::to_string_pretty(reports).map_err(|e| QueueError::serialization(e.to_string()))
}

/// Render reports as a text summary.
#[must_use]
pub fn format_report(reports: &[ScenarioReport], verbose: bool) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Scenario: {} ({})", report.name, report.model);
        let _ = writeln!(out, "{RULE}");
        match &report.status {
            ReportStatus::Stable { results } => {
                let _ = writeln!(out, "✓ stable");
                write_results(&mut out, results, verbose);
            }
            ReportStatus::Unstable { results } => {
                let _ = writeln!(out, "⚠ unstable: load meets or exceeds capacity");
                write_results(&mut out, results, verbose);
            }
            ReportStatus::Invalid { error } => {
                let _ = writeln!(out, "✗ invalid: {error}");
            }
        }
        out.push('\n');
    }

    let invalid = reports.iter().filter(|r| r.is_invalid()).count();
    let _ = writeln!(
        out,
        "{} scenario(s), {} invalid",
        reports.len(),
        invalid
    );
    out
}

fn write_results(out: &mut String, results: &Results, verbose: bool) {
    let Ok(Value::Object(fields)) = serde_json::to_value(results) else {
        return;
    };
    for (key, value) in fields.iter().filter(|(k, _)| k.as_str() != "model") {
        let _ = writeln!(out, "  {key:<26} {}", format_value(value, verbose));
    }
}

fn format_value(value: &Value, verbose: bool) -> String {
    match value {
        // Non-finite floats serialize as null
        Value::Null => "∞".to_string(),
        Value::Array(items) => {
            let shown = if verbose {
                items.len()
            } else {
                items.len().min(SHORT_SEQUENCE)
            };
            let body: Vec<String> = items[..shown]
                .iter()
                .map(|v| format_value(v, verbose))
                .collect();
            if shown < items.len() {
                format!("[{}, … {} more]", body.join(", "), items.len() - shown)
            } else {
                format!("[{}]", body.join(", "))
            }
        }
        other => other.to_string(),
    }
}
