//! qtheory CLI - queueing model solver
//!
//! Thin entry point: all logic lives in the `cli` module.

use std::process::ExitCode;

use qtheory::cli::{run_cli, Args};

fn main() -> ExitCode {
    run_cli(Args::parse())
}
