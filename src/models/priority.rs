//! Priority disciplines on `s` identical exponential servers.
//!
//! Classes are listed highest priority first. Both disciplines reuse the
//! M/M/s core for aggregate streams and report per-class sequences. A class
//! whose cumulative load reaches one has unbounded delay; it is reported as
//! `∞` and the outcome is tagged unstable, while higher classes keep their
//! finite values.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::multi_server::ErlangCore;
use super::{count, outcome, rate, ModelKind, QueueModel};
use crate::error::DomainError;
use crate::metrics::Evaluation;
use crate::precision::{Precision, Real};

/// Validated class parameters shared by both disciplines.
struct Classes {
    lambdas: Vec<Real>,
    mu: Real,
    servers: usize,
}

impl Classes {
    fn validate(arrival_rates: &[f64], service_rate: f64, servers: f64) -> Result<Self, DomainError> {
        if arrival_rates.is_empty() {
            return Err(DomainError::EmptyClasses);
        }
        let lambdas = arrival_rates
            .iter()
            .map(|&l| rate("arrival_rates", l))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            lambdas,
            mu: rate("service_rate", service_rate)?,
            servers: count("servers", servers, 1)?,
        })
    }

    fn capacity(&self) -> Real {
        Real::from(self.servers) * self.mu
    }

    /// Cumulative utilization `σ_k` of classes `1..=k`.
    fn cumulative_rho(&self) -> Vec<Real> {
        let capacity = self.capacity();
        self.lambdas
            .iter()
            .scan(Real::ZERO, |load, l| {
                *load = *load + *l;
                Some(*load / capacity)
            })
            .collect()
    }

    /// Per-class sequences from the time in system of each class (`None` = unbounded).
    fn report(
        &self,
        sojourn: &[Option<Real>],
        precision: &Precision,
    ) -> Result<PriorityResults, DomainError> {
        let service = Real::ONE / self.mu;
        let mut results = PriorityResults::with_classes(self.lambdas.len());
        let cumulative = self.cumulative_rho();
        results.rho = precision.report(*cumulative.last().unwrap_or(&Real::ZERO), "rho")?;
        results.cumulative_rho = precision.report_all(&cumulative, "cumulative rho")?;

        for (&lambda, w) in self.lambdas.iter().zip(sojourn) {
            let Some(w) = *w else {
                results.push_unbounded();
                continue;
            };
            let wq = (w - service).max(Real::ZERO);
            let l = lambda * w;
            let lq = (l - lambda * service).max(Real::ZERO);
            results.w.push(precision.report(w, "W")?);
            results.wq.push(precision.report(wq, "Wq")?);
            results.l.push(precision.report(l, "L")?);
            results.lq.push(precision.report(lq, "Lq")?);
        }
        Ok(results)
    }
}

/// Per-class results of a priority model, index 0 = highest priority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityResults {
    /// Aggregate utilization `Σλ/(sμ)`.
    pub rho: f64,
    /// Cumulative utilization of classes `1..=k`.
    pub cumulative_rho: Vec<f64>,
    /// Mean time in system per class.
    pub w: Vec<f64>,
    /// Mean time waiting per class.
    pub wq: Vec<f64>,
    /// Mean number in system per class.
    pub l: Vec<f64>,
    /// Mean number waiting per class.
    pub lq: Vec<f64>,
}

impl PriorityResults {
    fn with_classes(n: usize) -> Self {
        Self {
            rho: 0.0,
            cumulative_rho: Vec::with_capacity(n),
            w: Vec::with_capacity(n),
            wq: Vec::with_capacity(n),
            l: Vec::with_capacity(n),
            lq: Vec::with_capacity(n),
        }
    }

    fn push_unbounded(&mut self) {
        self.w.push(f64::INFINITY);
        self.wq.push(f64::INFINITY);
        self.l.push(f64::INFINITY);
        self.lq.push(f64::INFINITY);
    }

    /// Number of classes.
    #[must_use]
    pub fn classes(&self) -> usize {
        self.w.len()
    }

    /// Whether every class has a finite delay.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.w.iter().all(|w| w.is_finite())
    }
}

// =============================================================================
// Non-preemptive
// =============================================================================

/// M/M/s with non-preemptive priority classes.
///
/// `Wq_k = W0 / ((1 - σ_{k-1})(1 - σ_k))` where `W0 = C/(sμ)` is the mean
/// residual wait for a free server and `σ_k` the cumulative utilization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriorityNonPreemptive {
    /// Arrival rate per class, highest priority first.
    #[serde(alias = "lambdas")]
    pub arrival_rates: Vec<f64>,
    /// Service rate `μ` of one server (all classes).
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// Number of servers `s`.
    #[serde(default = "one", alias = "s")]
    pub servers: f64,
}

impl PriorityNonPreemptive {
    /// Create a record.
    #[must_use]
    pub const fn new(arrival_rates: Vec<f64>, service_rate: f64, servers: f64) -> Self {
        Self {
            arrival_rates,
            service_rate,
            servers,
        }
    }
}

impl QueueModel for PriorityNonPreemptive {
    type Output = PriorityResults;
    const KIND: ModelKind = ModelKind::PriorityNonPreemptive;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<PriorityResults>, DomainError> {
        let classes = Classes::validate(&self.arrival_rates, self.service_rate, self.servers)?;
        let cumulative = classes.cumulative_rho();
        let rho = cumulative.last().copied().unwrap_or(Real::ZERO);
        debug!(
            model = Self::KIND.notation(),
            rho = %rho,
            classes = classes.lambdas.len(),
            "evaluating"
        );

        // Past saturation every server is always busy.
        let delay = if rho < Real::ONE {
            let a = rho * Real::from(classes.servers);
            ErlangCore::solve(a, classes.servers)?.delay
        } else {
            Real::ONE
        };
        let residual = delay / classes.capacity();
        let service = Real::ONE / classes.mu;

        let sojourn: Vec<Option<Real>> = cumulative
            .iter()
            .enumerate()
            .map(|(k, &sigma)| {
                if sigma >= Real::ONE {
                    return None;
                }
                let above = if k == 0 { Real::ZERO } else { cumulative[k - 1] };
                let wq = residual / ((Real::ONE - above) * (Real::ONE - sigma));
                Some(wq + service)
            })
            .collect();

        let results = classes.report(&sojourn, precision)?;
        let bounded = results.is_bounded();
        Ok(outcome(Self::KIND, rho, bounded, results))
    }
}

// =============================================================================
// Preemptive
// =============================================================================

/// M/M/s with preemptive priority classes.
///
/// Classes `1..=k` never see class `k+1`, so their aggregate behaves as a
/// plain M/M/s stream. Class `k`'s mean time in system is what remains of
/// the prefix average once the higher classes are taken out:
/// `W_k = (W̄_k - Σ_{j<k} p_j·W_j) / p_k` with `p_j = λ_j / Σ_{i≤k} λ_i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriorityPreemptive {
    /// Arrival rate per class, highest priority first.
    #[serde(alias = "lambdas")]
    pub arrival_rates: Vec<f64>,
    /// Service rate `μ` of one server (all classes).
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// Number of servers `s`.
    #[serde(default = "one", alias = "s")]
    pub servers: f64,
}

impl PriorityPreemptive {
    /// Create a record.
    #[must_use]
    pub const fn new(arrival_rates: Vec<f64>, service_rate: f64, servers: f64) -> Self {
        Self {
            arrival_rates,
            service_rate,
            servers,
        }
    }
}

impl QueueModel for PriorityPreemptive {
    type Output = PriorityResults;
    const KIND: ModelKind = ModelKind::PriorityPreemptive;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<PriorityResults>, DomainError> {
        let classes = Classes::validate(&self.arrival_rates, self.service_rate, self.servers)?;
        let cumulative = classes.cumulative_rho();
        let rho = cumulative.last().copied().unwrap_or(Real::ZERO);
        debug!(
            model = Self::KIND.notation(),
            rho = %rho,
            classes = classes.lambdas.len(),
            "evaluating"
        );

        let s = Real::from(classes.servers);
        let service = Real::ONE / classes.mu;
        let mut sojourn: Vec<Option<Real>> = Vec::with_capacity(classes.lambdas.len());
        let mut prefix_rate = Real::ZERO;
        // Σ_{j<k} λ_j·W_j over the classes already resolved.
        let mut resolved = Some(Real::ZERO);

        for (&lambda, &sigma) in classes.lambdas.iter().zip(&cumulative) {
            prefix_rate = prefix_rate + lambda;
            let w = match resolved {
                Some(weighted) if sigma < Real::ONE => {
                    let core = ErlangCore::solve(sigma * s, classes.servers)?;
                    let prefix_w = core.lq / prefix_rate + service;
                    Some(((prefix_w * prefix_rate - weighted) / lambda).finite("W")?)
                }
                _ => None,
            };
            resolved = resolved.zip(w).map(|(acc, w)| acc + lambda * w);
            sojourn.push(w);
        }

        let results = classes.report(&sojourn, precision)?;
        let bounded = results.is_bounded();
        Ok(outcome(Self::KIND, rho, bounded, results))
    }
}

const fn one() -> f64 {
    1.0
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::models::multi_server::Mms;
    use proptest::prelude::*;

    proptest! {
        /// Both disciplines conserve the λ-weighted mean wait of the aggregate M/M/s.
        #[test]
        fn prop_priority_conserves_work(
            rates in prop::collection::vec(0.05f64..1.0, 1..6),
            servers in 1u32..4,
            headroom in 1.05f64..3.0,
        ) {
            let total: f64 = rates.iter().sum();
            let s = f64::from(servers);
            let mu = total * headroom / s;
            let aggregate = Mms::new(total, mu, s)
                .evaluate(&Precision::default())
                .expect("valid")
                .into_results();

            for results in [
                PriorityNonPreemptive::new(rates.clone(), mu, s)
                    .evaluate(&Precision::default())
                    .expect("valid")
                    .into_results(),
                PriorityPreemptive::new(rates.clone(), mu, s)
                    .evaluate(&Precision::default())
                    .expect("valid")
                    .into_results(),
            ] {
                let weighted: f64 = rates.iter().zip(&results.w).map(|(l, w)| l * w).sum();
                prop_assert!((weighted / total - aggregate.means.w).abs() < 1e-9 * aggregate.means.w);
                // Higher priority never waits longer
                for pair in results.wq.windows(2) {
                    prop_assert!(pair[0] <= pair[1] + 1e-12);
                }
            }
        }
    }
}
