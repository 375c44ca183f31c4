//! CLI argument parsing.
//!
//! A small hand-written parser over any string iterator, so parsing can be
//! tested without spawning a process.

use std::path::PathBuf;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Evaluate every scenario in a file
    Run {
        /// Path to the scenario YAML file.
        scenario_path: PathBuf,
        /// Emit JSON instead of a text report.
        json: bool,
        /// Enable verbose output.
        verbose: bool,
    },
    /// List supported models
    Models,
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// The first item is the program name, as with `std::env::args()`.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        let Some(first) = args.get(1) else {
            return Self {
                command: Command::Help,
            };
        };

        let command = match first.as_str() {
            "run" => Self::parse_run_command(&args[2..]),
            "models" | "list-models" => Command::Models,
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command }
    }

    /// Parse the 'run' command arguments (everything after `run`).
    fn parse_run_command(rest: &[String]) -> Command {
        let mut scenario_path = None;
        let mut json = false;
        let mut verbose = false;

        for arg in rest {
            match arg.as_str() {
                "--json" => json = true,
                "-v" | "--verbose" => verbose = true,
                flag if flag.starts_with('-') => eprintln!("Ignoring unknown flag: {flag}"),
                path if scenario_path.is_none() => scenario_path = Some(PathBuf::from(path)),
                extra => eprintln!("Ignoring extra argument: {extra}"),
            }
        }

        match scenario_path {
            Some(scenario_path) => Command::Run {
                scenario_path,
                json,
                verbose,
            },
            None => {
                eprintln!("Error: 'run' command requires a scenario file");
                Command::Help
            }
        }
    }
}
