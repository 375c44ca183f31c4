//! # qtheory
//!
//! Steady-state solvers for classical queueing models.
//!
//! Every model takes a parameter record and returns either an error for
//! invalid input or an [`Evaluation`](metrics::Evaluation):
//! - `Stable` when a steady state exists
//! - `Unstable` when load meets or exceeds capacity, with `∞` metrics
//!
//! Arithmetic runs in 28-digit decimal so deep occupancy recurrences keep
//! their accuracy; results are rounded to the configured precision.
//!
//! ## Example
//!
//! ```rust
//! use qtheory::prelude::*;
//!
//! let evaluation = Mms::new(4.0, 2.0, 3.0).evaluate(&Precision::default())?;
//! assert!(evaluation.is_stable());
//! let results = evaluation.into_results();
//! assert!((results.p0 - 1.0 / 9.0).abs() < 1e-12);
//! assert!((results.means.lq - 8.0 / 9.0).abs() < 1e-12);
//! # Ok::<(), qtheory::DomainError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
    clippy::many_single_char_names, // λ, μ, s, K, N follow queueing notation
)]

pub mod cli;
pub mod combinatorics;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod occupancy;
pub mod precision;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{Scenario, ScenarioFile, SolverConfig, SolverConfigBuilder};
    pub use crate::error::{DomainError, QueueError, QueueResult};
    pub use crate::metrics::{Evaluation, MeanMetrics};
    pub use crate::models::{
        evaluate, evaluate_with, Mg1, Mm1, Mm1Finite, Mm1k, Mm1n, ModelKind, Mms, MmsFinite,
        Mmsk, Parameters, PriorityNonPreemptive, PriorityPreemptive, QueueModel, Results,
    };
    pub use crate::precision::{Precision, Real};
}

/// Re-export for public API
pub use error::{DomainError, QueueError, QueueResult};
