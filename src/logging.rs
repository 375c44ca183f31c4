//! Log output for the `qtheory` binary and embedding applications.
//!
//! The library only emits `tracing` events; it never installs a subscriber.
//! Levels in use:
//! - **TRACE**: occupancy weights rescaled during a deep recurrence
//! - **DEBUG**: one event per model evaluation, with model and utilization
//! - **INFO**: scenario progress in the binary
//! - **WARN**: evaluation produced an unstable (unbounded) outcome
//!
//! `RUST_LOG` overrides the configured level:
//!
//! ```bash
//! RUST_LOG=qtheory=trace qtheory run scenarios.yaml
//! ```

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{QueueError, QueueResult};

/// Install a stderr subscriber filtered at `level` unless `RUST_LOG` is set.
///
/// # Errors
///
/// Returns a configuration error if `level` is not a valid filter directive
/// or a global subscriber is already installed.
pub fn try_init_logging(level: &str) -> QueueResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| QueueError::config(format!("invalid log level '{level}': {e}")))?,
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .try_init()
        .map_err(|e| QueueError::config(format!("logging already initialized: {e}")))?;

    info!(level, "logging initialized");
    Ok(())
}

/// Install a subscriber, ignoring a second initialization.
///
/// Invalid levels fall back to `info`.
pub fn init_logging(level: &str) {
    if try_init_logging(level).is_err() {
        let _ = try_init_logging("info");
    }
}
