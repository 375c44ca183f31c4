//! Little's-law wiring and evaluation outcomes.
//!
//! Every model funnels its mean values through [`MeanValues::from_queue_length`],
//! so the identities
//!
//! ```text
//! Wq = Lq / λₑ
//! W  = Wq + 1/μ
//! L  = Lq + λₑ/μ      (= λₑ·W)
//! ```
//!
//! hold by construction instead of being re-derived per model.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::precision::{Precision, Real};

/// Mean-value metrics in decimal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeanValues {
    /// Mean number in system.
    pub l: Real,
    /// Mean number waiting.
    pub lq: Real,
    /// Mean time in system.
    pub w: Real,
    /// Mean time waiting.
    pub wq: Real,
}

impl MeanValues {
    /// Derive all four metrics from the mean queue length and admitted throughput.
    #[must_use]
    pub fn from_queue_length(lq: Real, throughput: Real, service_rate: Real) -> Self {
        let wq = lq / throughput;
        let w = wq + Real::ONE / service_rate;
        let l = lq + throughput / service_rate;
        Self { l, lq, w, wq }
    }

    /// Round and convert for a results record.
    ///
    /// # Errors
    ///
    /// Returns the fault of the first poisoned metric.
    pub fn report(&self, precision: &Precision) -> Result<MeanMetrics, DomainError> {
        Ok(MeanMetrics {
            l: precision.report(self.l, "L")?,
            lq: precision.report(self.lq, "Lq")?,
            w: precision.report(self.w, "W")?,
            wq: precision.report(self.wq, "Wq")?,
        })
    }
}

/// Mean-value metrics as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanMetrics {
    /// Mean number in system.
    pub l: f64,
    /// Mean number waiting.
    pub lq: f64,
    /// Mean time in system.
    pub w: f64,
    /// Mean time waiting.
    pub wq: f64,
}

impl MeanMetrics {
    /// Metrics of a system whose queue grows without bound.
    pub const UNBOUNDED: Self = Self {
        l: f64::INFINITY,
        lq: f64::INFINITY,
        w: f64::INFINITY,
        wq: f64::INFINITY,
    };

    /// Whether every metric is finite.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.l.is_finite() && self.lq.is_finite() && self.w.is_finite() && self.wq.is_finite()
    }
}

/// Outcome of a successful evaluation.
///
/// Invalid parameters never reach this type; they surface as `Err(DomainError)`.
/// `Unstable` carries a well-formed record whose unbounded metrics are `∞`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "results", rename_all = "lowercase")]
pub enum Evaluation<R> {
    /// Steady state exists; every metric is finite.
    Stable(R),
    /// Load meets or exceeds capacity; some metrics are unbounded.
    Unstable(R),
}

impl<R> Evaluation<R> {
    /// Whether a steady state exists.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        matches!(self, Self::Stable(_))
    }

    /// Borrow the results record.
    #[must_use]
    pub const fn results(&self) -> &R {
        match self {
            Self::Stable(r) | Self::Unstable(r) => r,
        }
    }

    /// Take the results record, discarding the tag.
    #[must_use]
    pub fn into_results(self) -> R {
        match self {
            Self::Stable(r) | Self::Unstable(r) => r,
        }
    }

    /// Transform the record, keeping the tag.
    pub fn map<T>(self, f: impl FnOnce(R) -> T) -> Evaluation<T> {
        match self {
            Self::Stable(r) => Evaluation::Stable(f(r)),
            Self::Unstable(r) => Evaluation::Unstable(f(r)),
        }
    }
}
