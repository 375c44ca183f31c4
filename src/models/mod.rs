//! Queueing model evaluators.
//!
//! Each model is a plain parameter record implementing [`QueueModel`]. Records
//! hold caller-supplied floats exactly as entered; validation happens on
//! evaluation, so a record deserialized from YAML and one built in code go
//! through the same checks.
//!
//! # Example
//!
//! ```rust
//! use qtheory::models::{evaluate, ModelKind, Parameters, Results};
//! use qtheory::models::single_server::Mm1;
//!
//! let params = Parameters::Mm1(Mm1::new(2.0, 5.0));
//! let outcome = evaluate(ModelKind::Mm1, &params).unwrap();
//! assert!(outcome.is_stable());
//! if let Results::Mm1(r) = outcome.results() {
//!     assert!((r.p0 - 0.6).abs() < 1e-12);
//! }
//! ```

pub mod multi_server;
pub mod priority;
pub mod single_server;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DomainError;
use crate::metrics::Evaluation;
use crate::precision::{Precision, Real};

pub use multi_server::{Mms, MmsFinite, MmsFiniteResults, MmsResults, Mmsk, MmskResults};
pub use priority::{PriorityNonPreemptive, PriorityPreemptive, PriorityResults};
pub use single_server::{
    Mg1, Mg1Results, Mm1, Mm1Finite, Mm1FiniteResults, Mm1Results, Mm1k, Mm1kResults, Mm1n,
    Mm1nResults,
};

/// Largest count (capacity, population, servers, state index) accepted.
pub const MAX_COUNT: usize = 1_000_000;

/// A queueing model that can be evaluated to a results record.
pub trait QueueModel {
    /// Results record produced by the model.
    type Output;

    /// Which model this is.
    const KIND: ModelKind;

    /// Evaluate the steady state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` for any invalid parameter, and for intermediate
    /// quantities that leave the decimal range.
    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<Self::Output>, DomainError>;
}

/// Supported models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Single server, infinite capacity.
    Mm1,
    /// Single server, capacity `K`, full occupancy list.
    Mm1k,
    /// Single server, capacity `N`, point query.
    Mm1n,
    /// Single server, `N` sources (machine repair).
    Mm1Finite,
    /// Single server, general service time.
    Mg1,
    /// `s` servers, infinite capacity.
    Mms,
    /// `s` servers, capacity `K`.
    Mmsk,
    /// `s` servers, `N` sources.
    MmsFinite,
    /// `s` servers, non-preemptive priority classes.
    PriorityNonPreemptive,
    /// `s` servers, preemptive priority classes.
    PriorityPreemptive,
}

impl ModelKind {
    /// Every supported model, in listing order.
    pub const ALL: [Self; 10] = [
        Self::Mm1,
        Self::Mm1k,
        Self::Mm1n,
        Self::Mm1Finite,
        Self::Mg1,
        Self::Mms,
        Self::Mmsk,
        Self::MmsFinite,
        Self::PriorityNonPreemptive,
        Self::PriorityPreemptive,
    ];

    /// Kendall notation.
    #[must_use]
    pub const fn notation(self) -> &'static str {
        match self {
            Self::Mm1 => "M/M/1",
            Self::Mm1k => "M/M/1/K",
            Self::Mm1n => "M/M/1/N",
            Self::Mm1Finite => "M/M/1//N",
            Self::Mg1 => "M/G/1",
            Self::Mms => "M/M/s",
            Self::Mmsk => "M/M/s/K",
            Self::MmsFinite => "M/M/s//N",
            Self::PriorityNonPreemptive => "M/M/s/NPRP",
            Self::PriorityPreemptive => "M/M/s/PRP",
        }
    }

    /// Tag used in scenario files.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Mm1 => "mm1",
            Self::Mm1k => "mm1k",
            Self::Mm1n => "mm1n",
            Self::Mm1Finite => "mm1-finite",
            Self::Mg1 => "mg1",
            Self::Mms => "mms",
            Self::Mmsk => "mmsk",
            Self::MmsFinite => "mms-finite",
            Self::PriorityNonPreemptive => "priority-non-preemptive",
            Self::PriorityPreemptive => "priority-preemptive",
        }
    }

    /// One-line description for listings.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Mm1 => "single server, unlimited queue",
            Self::Mm1k => "single server, capacity K, full occupancy list",
            Self::Mm1n => "single server, capacity N, point query and overflow",
            Self::Mm1Finite => "single server, N sources (machine repair)",
            Self::Mg1 => "single server, general service (Pollaczek-Khinchine)",
            Self::Mms => "s servers, unlimited queue (Erlang C)",
            Self::Mmsk => "s servers, capacity K",
            Self::MmsFinite => "s servers, N sources",
            Self::PriorityNonPreemptive => "s servers, non-preemptive priority classes",
            Self::PriorityPreemptive => "s servers, preemptive priority classes",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notation())
    }
}

/// A parameter record for exactly one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum Parameters {
    /// M/M/1.
    Mm1(Mm1),
    /// M/M/1/K.
    Mm1k(Mm1k),
    /// M/M/1/N.
    Mm1n(Mm1n),
    /// M/M/1 with finite population.
    Mm1Finite(Mm1Finite),
    /// M/G/1.
    Mg1(Mg1),
    /// M/M/s.
    Mms(Mms),
    /// M/M/s/K.
    Mmsk(Mmsk),
    /// M/M/s with finite population.
    MmsFinite(MmsFinite),
    /// Non-preemptive priority.
    PriorityNonPreemptive(PriorityNonPreemptive),
    /// Preemptive priority.
    PriorityPreemptive(PriorityPreemptive),
}

impl Parameters {
    /// The model these parameters describe.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Mm1(_) => ModelKind::Mm1,
            Self::Mm1k(_) => ModelKind::Mm1k,
            Self::Mm1n(_) => ModelKind::Mm1n,
            Self::Mm1Finite(_) => ModelKind::Mm1Finite,
            Self::Mg1(_) => ModelKind::Mg1,
            Self::Mms(_) => ModelKind::Mms,
            Self::Mmsk(_) => ModelKind::Mmsk,
            Self::MmsFinite(_) => ModelKind::MmsFinite,
            Self::PriorityNonPreemptive(_) => ModelKind::PriorityNonPreemptive,
            Self::PriorityPreemptive(_) => ModelKind::PriorityPreemptive,
        }
    }

    /// Evaluate whichever model these parameters describe.
    ///
    /// # Errors
    ///
    /// Propagates the model's `DomainError`.
    pub fn evaluate(&self, precision: &Precision) -> Result<Evaluation<Results>, DomainError> {
        Ok(match self {
            Self::Mm1(m) => m.evaluate(precision)?.map(Results::Mm1),
            Self::Mm1k(m) => m.evaluate(precision)?.map(Results::Mm1k),
            Self::Mm1n(m) => m.evaluate(precision)?.map(Results::Mm1n),
            Self::Mm1Finite(m) => m.evaluate(precision)?.map(Results::Mm1Finite),
            Self::Mg1(m) => m.evaluate(precision)?.map(Results::Mg1),
            Self::Mms(m) => m.evaluate(precision)?.map(Results::Mms),
            Self::Mmsk(m) => m.evaluate(precision)?.map(Results::Mmsk),
            Self::MmsFinite(m) => m.evaluate(precision)?.map(Results::MmsFinite),
            Self::PriorityNonPreemptive(m) => {
                m.evaluate(precision)?.map(Results::PriorityNonPreemptive)
            }
            Self::PriorityPreemptive(m) => m.evaluate(precision)?.map(Results::PriorityPreemptive),
        })
    }
}

/// A results record for exactly one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum Results {
    /// M/M/1.
    Mm1(Mm1Results),
    /// M/M/1/K.
    Mm1k(Mm1kResults),
    /// M/M/1/N.
    Mm1n(Mm1nResults),
    /// M/M/1 with finite population.
    Mm1Finite(Mm1FiniteResults),
    /// M/G/1.
    Mg1(Mg1Results),
    /// M/M/s.
    Mms(MmsResults),
    /// M/M/s/K.
    Mmsk(MmskResults),
    /// M/M/s with finite population.
    MmsFinite(MmsFiniteResults),
    /// Non-preemptive priority.
    PriorityNonPreemptive(PriorityResults),
    /// Preemptive priority.
    PriorityPreemptive(PriorityResults),
}

impl Results {
    /// The model that produced these results.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Mm1(_) => ModelKind::Mm1,
            Self::Mm1k(_) => ModelKind::Mm1k,
            Self::Mm1n(_) => ModelKind::Mm1n,
            Self::Mm1Finite(_) => ModelKind::Mm1Finite,
            Self::Mg1(_) => ModelKind::Mg1,
            Self::Mms(_) => ModelKind::Mms,
            Self::Mmsk(_) => ModelKind::Mmsk,
            Self::MmsFinite(_) => ModelKind::MmsFinite,
            Self::PriorityNonPreemptive(_) => ModelKind::PriorityNonPreemptive,
            Self::PriorityPreemptive(_) => ModelKind::PriorityPreemptive,
        }
    }
}

/// Evaluate a model at full precision.
///
/// # Errors
///
/// Returns `ModelMismatch` if `parameters` describe a different model than
/// `kind`, otherwise the model's own `DomainError`.
pub fn evaluate(kind: ModelKind, parameters: &Parameters) -> Result<Evaluation<Results>, DomainError> {
    evaluate_with(kind, parameters, &Precision::default())
}

/// Evaluate a model with an explicit precision context.
///
/// # Errors
///
/// See [`evaluate`].
pub fn evaluate_with(
    kind: ModelKind,
    parameters: &Parameters,
    precision: &Precision,
) -> Result<Evaluation<Results>, DomainError> {
    let found = parameters.kind();
    if found != kind {
        return Err(DomainError::ModelMismatch {
            expected: kind.notation(),
            found: found.notation(),
        });
    }
    parameters.evaluate(precision)
}

// =============================================================================
// Shared parameter validation
// =============================================================================

/// A strictly positive, finite rate.
pub(crate) fn rate(name: &'static str, value: f64) -> Result<Real, DomainError> {
    let r = Real::from_f64(name, value)?;
    if r.is_positive() {
        Ok(r)
    } else {
        Err(DomainError::non_positive(name, value))
    }
}

/// A finite, non-negative value.
pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<Real, DomainError> {
    let r = Real::from_f64(name, value)?;
    if r.is_negative() {
        Err(DomainError::negative(name, value))
    } else {
        Ok(r)
    }
}

/// An integral count in `min..=MAX_COUNT`.
pub(crate) fn count(name: &'static str, value: f64, min: usize) -> Result<usize, DomainError> {
    if !value.is_finite() {
        return Err(DomainError::NotFinite { name });
    }
    if value.fract() != 0.0 {
        return Err(DomainError::not_an_integer(name, value));
    }
    if value < min as f64 {
        return Err(if min == 0 {
            DomainError::negative(name, value)
        } else {
            DomainError::OutOfRange {
                name,
                value,
                min: min as f64,
            }
        });
    }
    if value > MAX_COUNT as f64 {
        return Err(DomainError::TooLarge {
            name,
            value,
            max: MAX_COUNT,
        });
    }
    Ok(value as usize)
}

/// Tag a finished record, logging when there is no steady state.
pub(crate) fn outcome<R>(kind: ModelKind, rho: Real, bounded: bool, results: R) -> Evaluation<R> {
    if bounded {
        Evaluation::Stable(results)
    } else {
        warn!(model = kind.notation(), rho = %rho, "no steady state, metrics are unbounded");
        Evaluation::Unstable(results)
    }
}
