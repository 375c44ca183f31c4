//! Single-server models: M/M/1, M/M/1/K, M/M/1/N, M/M/1//N, M/G/1.
//!
//! All five follow the same skeleton: `ρ`, then state probabilities, then the
//! Little's-law means from [`MeanValues`], then tail probabilities. The
//! bounded variants delegate the middle steps to [`SteadyState::solve`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::multi_server::FiniteSource;
use super::{count, non_negative, outcome, rate, ModelKind, QueueModel};
use crate::combinatorics::erlang_survival;
use crate::error::DomainError;
use crate::metrics::{Evaluation, MeanMetrics, MeanValues};
use crate::occupancy::{OccupancyPolicy, SteadyState};
use crate::precision::{Precision, Real};

/// Single server with room for `capacity` customers in total.
///
/// Weights are the truncated geometric `ρ^n`, so the normalizing constant has
/// the closed form `(1 - ρ^(K+1)) / (1 - ρ)`, or `K + 1` at `ρ = 1`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FiniteBuffer {
    pub lambda: Real,
    pub mu: Real,
    pub capacity: usize,
}

impl FiniteBuffer {
    fn rho(&self) -> Real {
        self.lambda / self.mu
    }
}

impl OccupancyPolicy for FiniteBuffer {
    fn model(&self) -> &'static str {
        "M/M/1/K"
    }

    fn servers(&self) -> usize {
        1
    }

    fn service_rate(&self) -> Real {
        self.mu
    }

    fn max_state(&self) -> usize {
        self.capacity
    }

    fn arrival_rate(&self, n: usize) -> Real {
        if n < self.capacity {
            self.lambda
        } else {
            Real::ZERO
        }
    }

    fn normalizing_constant(&self, weights: &[Real]) -> Real {
        let fallback = || weights.iter().sum();
        // Rescaled weights no longer start at one.
        if weights.first() != Some(&Real::ONE) {
            return fallback();
        }
        let rho = self.rho();
        if rho == Real::ONE {
            return Real::from(self.capacity + 1);
        }
        let closed = (Real::ONE - rho.powu(self.capacity as u64 + 1)) / (Real::ONE - rho);
        if closed.is_finite() {
            closed
        } else {
            fallback()
        }
    }
}

// =============================================================================
// M/M/1
// =============================================================================

/// M/M/1: Poisson arrivals, one exponential server, unlimited queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mm1 {
    /// Arrival rate `λ`.
    #[serde(alias = "lambda")]
    pub arrival_rate: f64,
    /// Service rate `μ`.
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// Query state `n` for `Pn`.
    #[serde(default, alias = "n")]
    pub state: f64,
    /// Threshold `r` for `P(N > r)`.
    #[serde(default, alias = "r")]
    pub threshold: f64,
    /// Horizon `t` for the delay tails.
    #[serde(default, alias = "t")]
    pub time: f64,
}

impl Mm1 {
    /// Create a record with all queries at zero.
    #[must_use]
    pub const fn new(arrival_rate: f64, service_rate: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            state: 0.0,
            threshold: 0.0,
            time: 0.0,
        }
    }

    /// Set the query state `n`.
    #[must_use]
    pub const fn with_state(mut self, n: f64) -> Self {
        self.state = n;
        self
    }

    /// Set the threshold `r`.
    #[must_use]
    pub const fn with_threshold(mut self, r: f64) -> Self {
        self.threshold = r;
        self
    }

    /// Set the horizon `t`.
    #[must_use]
    pub const fn with_time(mut self, t: f64) -> Self {
        self.time = t;
        self
    }
}

/// M/M/1 results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mm1Results {
    /// Utilization `λ/μ`.
    pub rho: f64,
    /// `P(N = 0)`.
    pub p0: f64,
    /// `P(N = n)` at the query state.
    pub pn: f64,
    /// Mean values.
    #[serde(flatten)]
    pub means: MeanMetrics,
    /// `P(N > r)`.
    pub tail_above_threshold: f64,
    /// `P(Wq = 0)`.
    pub prob_no_wait: f64,
    /// `P(Wq > t)`.
    pub prob_queue_time_exceeds: f64,
    /// `P(W > t)`.
    pub prob_system_time_exceeds: f64,
}

impl QueueModel for Mm1 {
    type Output = Mm1Results;
    const KIND: ModelKind = ModelKind::Mm1;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<Mm1Results>, DomainError> {
        let lambda = rate("arrival_rate", self.arrival_rate)?;
        let mu = rate("service_rate", self.service_rate)?;
        let n = count("state", self.state, 0)?;
        let r = count("threshold", self.threshold, 0)?;
        let t = non_negative("time", self.time)?;
        let rho = (lambda / mu).finite("rho")?;
        debug!(model = Self::KIND.notation(), rho = %rho, "evaluating");

        if rho >= Real::ONE {
            let results = Mm1Results {
                rho: precision.report(rho, "rho")?,
                p0: 0.0,
                pn: 0.0,
                means: MeanMetrics::UNBOUNDED,
                tail_above_threshold: 1.0,
                prob_no_wait: 0.0,
                prob_queue_time_exceeds: 1.0,
                prob_system_time_exceeds: 1.0,
            };
            return Ok(outcome(Self::KIND, rho, false, results));
        }

        let idle = Real::ONE - rho;
        let lq = rho * rho / idle;
        let means = MeanValues::from_queue_length(lq, lambda, mu);
        let sojourn_tail = erlang_survival(1, mu * idle, t);

        let results = Mm1Results {
            rho: precision.report(rho, "rho")?,
            p0: precision.report(idle, "P0")?,
            pn: precision.report(idle * rho.powu(n as u64), "Pn")?,
            means: means.report(precision)?,
            tail_above_threshold: precision.report(rho.powu(r as u64 + 1), "P(N>r)")?,
            prob_no_wait: precision.report(idle, "P(Wq=0)")?,
            prob_queue_time_exceeds: precision.report(rho * sojourn_tail, "P(Wq>t)")?,
            prob_system_time_exceeds: precision.report(sojourn_tail, "P(W>t)")?,
        };
        Ok(outcome(Self::KIND, rho, true, results))
    }
}

// =============================================================================
// M/M/1/K
// =============================================================================

/// M/M/1/K: one server, at most `K` customers in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mm1k {
    /// Arrival rate `λ`.
    #[serde(alias = "lambda")]
    pub arrival_rate: f64,
    /// Service rate `μ`.
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// System capacity `K`.
    #[serde(alias = "k")]
    pub capacity: f64,
    /// Horizon `t` for the delay tails.
    #[serde(default, alias = "t")]
    pub time: f64,
}

impl Mm1k {
    /// Create a record with `t = 0`.
    #[must_use]
    pub const fn new(arrival_rate: f64, service_rate: f64, capacity: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            capacity,
            time: 0.0,
        }
    }

    /// Set the horizon `t`.
    #[must_use]
    pub const fn with_time(mut self, t: f64) -> Self {
        self.time = t;
        self
    }
}

/// M/M/1/K results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mm1kResults {
    /// Offered load `λ/μ`.
    pub rho: f64,
    /// `P(N = 0)`.
    pub p0: f64,
    /// `P(N = n)` for `n = 0..=K`.
    pub probabilities: Vec<f64>,
    /// Blocking probability `P(N = K)`.
    pub blocking: f64,
    /// Admitted throughput `λ(1 - P(N = K))`.
    pub effective_arrival_rate: f64,
    /// Mean values.
    #[serde(flatten)]
    pub means: MeanMetrics,
    /// `P(Wq = 0)` for admitted arrivals.
    pub prob_no_wait: f64,
    /// `P(Wq > t)` for admitted arrivals.
    pub prob_queue_time_exceeds: f64,
    /// `P(W > t)` for admitted arrivals.
    pub prob_system_time_exceeds: f64,
}

impl QueueModel for Mm1k {
    type Output = Mm1kResults;
    const KIND: ModelKind = ModelKind::Mm1k;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<Mm1kResults>, DomainError> {
        let lambda = rate("arrival_rate", self.arrival_rate)?;
        let mu = rate("service_rate", self.service_rate)?;
        let capacity = count("capacity", self.capacity, 1)?;
        let t = non_negative("time", self.time)?;
        let policy = FiniteBuffer {
            lambda,
            mu,
            capacity,
        };
        let rho = policy.rho().finite("rho")?;
        debug!(model = Self::KIND.notation(), rho = %rho, capacity, "evaluating");

        let state = SteadyState::solve(&policy)?;
        let dist = &state.distribution;
        // An arrival admitted with j present waits j services in queue, j + 1 in system.
        let queue_tail = state.arrival_survival(t, |j| (j as u64, mu));
        let system_tail = state.arrival_survival(t, |j| (j as u64 + 1, mu));

        let results = Mm1kResults {
            rho: precision.report(rho, "rho")?,
            p0: precision.report(dist.probability(0), "P0")?,
            probabilities: precision.report_all(dist.probabilities(), "Pn")?,
            blocking: precision.report(dist.probability(capacity), "P(N=K)")?,
            effective_arrival_rate: precision.report(state.throughput, "effective arrival rate")?,
            means: state.means.report(precision)?,
            prob_no_wait: precision.report(state.arrival_view[0], "P(Wq=0)")?,
            prob_queue_time_exceeds: precision.report(queue_tail, "P(Wq>t)")?,
            prob_system_time_exceeds: precision.report(system_tail, "P(W>t)")?,
        };
        Ok(outcome(Self::KIND, rho, true, results))
    }
}

// =============================================================================
// M/M/1/N
// =============================================================================

/// M/M/1/N: one server, capacity `N`, evaluated at a query state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mm1n {
    /// Arrival rate `λ`.
    #[serde(alias = "lambda")]
    pub arrival_rate: f64,
    /// Service rate `μ`.
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// System capacity `N`.
    #[serde(alias = "n_max")]
    pub capacity: f64,
    /// Query state `n` for `Pn`.
    #[serde(default, alias = "n")]
    pub state: f64,
    /// Threshold `r` for the overflow probability `P(N > r)`.
    #[serde(default, alias = "r")]
    pub threshold: f64,
}

impl Mm1n {
    /// Create a record with all queries at zero.
    #[must_use]
    pub const fn new(arrival_rate: f64, service_rate: f64, capacity: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            capacity,
            state: 0.0,
            threshold: 0.0,
        }
    }

    /// Set the query state `n`.
    #[must_use]
    pub const fn with_state(mut self, n: f64) -> Self {
        self.state = n;
        self
    }

    /// Set the threshold `r`.
    #[must_use]
    pub const fn with_threshold(mut self, r: f64) -> Self {
        self.threshold = r;
        self
    }
}

/// M/M/1/N results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mm1nResults {
    /// Offered load `λ/μ`.
    pub rho: f64,
    /// `P(N = 0)`.
    pub p0: f64,
    /// `P(N = n)` at the query state; zero beyond capacity.
    pub pn: f64,
    /// Blocking probability `P(N = N_max)`.
    pub blocking: f64,
    /// Overflow probability `P(N > r)`.
    pub overflow: f64,
    /// Admitted throughput.
    pub effective_arrival_rate: f64,
    /// Mean values.
    #[serde(flatten)]
    pub means: MeanMetrics,
}

impl QueueModel for Mm1n {
    type Output = Mm1nResults;
    const KIND: ModelKind = ModelKind::Mm1n;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<Mm1nResults>, DomainError> {
        let lambda = rate("arrival_rate", self.arrival_rate)?;
        let mu = rate("service_rate", self.service_rate)?;
        let capacity = count("capacity", self.capacity, 1)?;
        let n = count("state", self.state, 0)?;
        let r = count("threshold", self.threshold, 0)?;
        let policy = FiniteBuffer {
            lambda,
            mu,
            capacity,
        };
        let rho = policy.rho().finite("rho")?;
        debug!(model = Self::KIND.notation(), rho = %rho, capacity, "evaluating");

        let state = SteadyState::solve(&policy)?;
        let dist = &state.distribution;
        let results = Mm1nResults {
            rho: precision.report(rho, "rho")?,
            p0: precision.report(dist.probability(0), "P0")?,
            pn: precision.report(dist.probability(n), "Pn")?,
            blocking: precision.report(dist.probability(capacity), "P(N=N)")?,
            overflow: precision.report(dist.tail_above(r), "P(N>r)")?,
            effective_arrival_rate: precision.report(state.throughput, "effective arrival rate")?,
            means: state.means.report(precision)?,
        };
        Ok(outcome(Self::KIND, rho, true, results))
    }
}

// =============================================================================
// M/M/1//N (machine repair)
// =============================================================================

/// M/M/1 with a finite population of `N` sources.
///
/// Each source outside the system generates arrivals at rate `λ`, so the
/// arrival rate in state `n` is `(N - n)λ`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mm1Finite {
    /// Arrival rate `λ` of one idle source.
    #[serde(alias = "lambda")]
    pub arrival_rate: f64,
    /// Service rate `μ`.
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// Population size `N`.
    #[serde(alias = "n_sources")]
    pub population: f64,
}

impl Mm1Finite {
    /// Create a record.
    #[must_use]
    pub const fn new(arrival_rate: f64, service_rate: f64, population: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            population,
        }
    }
}

/// M/M/1//N results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mm1FiniteResults {
    /// Per-source load `λ/μ`.
    pub rho: f64,
    /// `P(N = 0)`.
    pub p0: f64,
    /// `P(N = n)` for `n = 0..=N`.
    pub probabilities: Vec<f64>,
    /// Server utilization `1 - P0`.
    pub utilization: f64,
    /// Admitted throughput `λ(N - L)`.
    pub effective_arrival_rate: f64,
    /// Mean values.
    #[serde(flatten)]
    pub means: MeanMetrics,
}

impl QueueModel for Mm1Finite {
    type Output = Mm1FiniteResults;
    const KIND: ModelKind = ModelKind::Mm1Finite;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<Mm1FiniteResults>, DomainError> {
        let lambda = rate("arrival_rate", self.arrival_rate)?;
        let mu = rate("service_rate", self.service_rate)?;
        let population = count("population", self.population, 1)?;
        let rho = (lambda / mu).finite("rho")?;
        debug!(model = Self::KIND.notation(), rho = %rho, population, "evaluating");

        let policy = FiniteSource {
            lambda,
            mu,
            servers: 1,
            population,
        };
        let state = SteadyState::solve(&policy)?;
        let dist = &state.distribution;
        let p0 = dist.probability(0);

        let results = Mm1FiniteResults {
            rho: precision.report(rho, "rho")?,
            p0: precision.report(p0, "P0")?,
            probabilities: precision.report_all(dist.probabilities(), "Pn")?,
            utilization: precision.report(Real::ONE - p0, "utilization")?,
            effective_arrival_rate: precision.report(state.throughput, "effective arrival rate")?,
            means: state.means.report(precision)?,
        };
        Ok(outcome(Self::KIND, rho, true, results))
    }
}

// =============================================================================
// M/G/1
// =============================================================================

/// M/G/1: one server whose service time has mean `1/μ` and standard deviation `σ`.
///
/// Only mean values exist in closed form (Pollaczek–Khinchine). A load of
/// `ρ ≥ 1` is rejected as [`DomainError::Unstable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mg1 {
    /// Arrival rate `λ`.
    #[serde(alias = "lambda")]
    pub arrival_rate: f64,
    /// Service rate `μ`.
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// Standard deviation `σ` of the service time.
    #[serde(default, alias = "sigma")]
    pub service_std_dev: f64,
}

impl Mg1 {
    /// Create a record.
    #[must_use]
    pub const fn new(arrival_rate: f64, service_rate: f64, service_std_dev: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            service_std_dev,
        }
    }
}

/// M/G/1 results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mg1Results {
    /// Utilization `λ/μ`.
    pub rho: f64,
    /// `P(N = 0) = 1 - ρ`.
    pub p0: f64,
    /// Mean values.
    #[serde(flatten)]
    pub means: MeanMetrics,
}

impl QueueModel for Mg1 {
    type Output = Mg1Results;
    const KIND: ModelKind = ModelKind::Mg1;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<Mg1Results>, DomainError> {
        let lambda = rate("arrival_rate", self.arrival_rate)?;
        let mu = rate("service_rate", self.service_rate)?;
        let sigma = non_negative("service_std_dev", self.service_std_dev)?;
        let rho = (lambda / mu).finite("rho")?;
        debug!(model = Self::KIND.notation(), rho = %rho, "evaluating");
        if rho >= Real::ONE {
            return Err(DomainError::Unstable {
                model: Self::KIND.notation(),
                rho: rho.to_f64(),
            });
        }

        let idle = Real::ONE - rho;
        let lq = (lambda * lambda * sigma * sigma + rho * rho) / (Real::TWO * idle);
        let means = MeanValues::from_queue_length(lq.finite("Lq")?, lambda, mu);

        let results = Mg1Results {
            rho: precision.report(rho, "rho")?,
            p0: precision.report(idle, "P0")?,
            means: means.report(precision)?,
        };
        Ok(outcome(Self::KIND, rho, true, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval<M: QueueModel>(model: &M) -> Evaluation<M::Output> {
        model.evaluate(&Precision::default()).expect("valid parameters")
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-15
    }

    #[test]
    fn test_mm1_textbook_values() {
        let outcome = eval(&Mm1::new(2.0, 5.0).with_state(2.0).with_threshold(1.0));
        assert!(outcome.is_stable());
        let r = outcome.results();
        assert!(close(r.rho, 0.4));
        assert!(close(r.p0, 0.6));
        assert!(close(r.pn, 0.6 * 0.16));
        assert!(close(r.means.l, 2.0 / 3.0));
        assert!(close(r.means.w, 1.0 / 3.0));
        assert!(close(r.means.lq, 0.16 / 0.6));
        assert!(close(r.tail_above_threshold, 0.16));
        assert!(close(r.prob_no_wait, 0.6));
    }

    #[test]
    fn test_mm1_delay_tails() {
        let r = eval(&Mm1::new(2.0, 5.0).with_time(1.0)).into_results();
        let decay = (-3.0_f64).exp();
        assert!((r.prob_system_time_exceeds - decay).abs() < 1e-12);
        assert!((r.prob_queue_time_exceeds - 0.4 * decay).abs() < 1e-12);

        let at_zero = eval(&Mm1::new(2.0, 5.0)).into_results();
        assert_eq!(at_zero.prob_system_time_exceeds, 1.0);
        assert!(close(at_zero.prob_queue_time_exceeds, 0.4));
    }

    #[test]
    fn test_mm1_fast_server_reports_tiny_waits_exactly() {
        // λ = 1e9, μ = 2e10: Wq = ρ/(μ-λ) sits near 1e-12
        let r = eval(&Mm1::new(1e9, 2e10)).into_results();
        let wq = 0.05 / 1.9e10;
        assert!((r.means.wq / wq - 1.0).abs() < 1e-14);
        assert!((r.means.w / (1.0 / 1.9e10) - 1.0).abs() < 1e-14);
        assert!(((r.means.w - r.means.wq) * 2e10 - 1.0).abs() < 1e-9);

        let coarse = Mm1::new(1e9, 2e10)
            .evaluate(&Precision::new(12, 20))
            .expect("valid parameters")
            .into_results();
        assert!((coarse.means.wq / wq - 1.0).abs() < 1e-11);
    }

    #[test]
    fn test_mm1_tails_vanish_past_decimal_range() {
        // μ(1-ρ)t overflows the decimal range; the tails are zero, not an error
        let r = eval(&Mm1::new(1.0, 1e10).with_time(1e20)).into_results();
        assert_eq!(r.prob_system_time_exceeds, 0.0);
        assert_eq!(r.prob_queue_time_exceeds, 0.0);
    }

    #[test]
    fn test_mm1_unstable_is_reported_not_rejected() {
        let outcome = eval(&Mm1::new(5.0, 2.0));
        assert!(!outcome.is_stable());
        let r = outcome.results();
        assert_eq!(r.means, MeanMetrics::UNBOUNDED);
        assert_eq!(r.p0, 0.0);
        assert_eq!(r.tail_above_threshold, 1.0);
        assert_eq!(r.prob_system_time_exceeds, 1.0);
        assert!(close(r.rho, 2.5));

        // ρ = 1 exactly is unstable too
        assert!(!eval(&Mm1::new(3.0, 3.0)).is_stable());
    }

    #[test]
    fn test_mm1_rejects_bad_rates() {
        let p = Precision::default();
        assert!(matches!(
            Mm1::new(0.0, 5.0).evaluate(&p),
            Err(DomainError::NonPositive {
                name: "arrival_rate",
                ..
            })
        ));
        assert!(matches!(
            Mm1::new(1.0, -5.0).evaluate(&p),
            Err(DomainError::NonPositive {
                name: "service_rate",
                ..
            })
        ));
        assert!(Mm1::new(1.0, 5.0).with_time(-1.0).evaluate(&p).is_err());
        assert!(Mm1::new(1.0, 5.0).with_state(1.5).evaluate(&p).is_err());
    }

    #[test]
    fn test_mm1k_critical_load_is_uniform() {
        let r = eval(&Mm1k::new(3.0, 3.0, 5.0)).into_results();
        assert_eq!(r.probabilities.len(), 6);
        for p in &r.probabilities {
            assert!(close(*p, 1.0 / 6.0));
        }
        assert!(close(r.p0, 1.0 / 6.0));
        assert!(close(r.blocking, 1.0 / 6.0));
        assert!(close(r.means.l, 2.5));
        assert!(close(r.effective_arrival_rate, 2.5));
    }

    #[test]
    fn test_mm1k_closed_form_matches_geometric() {
        // ρ = 0.5, K = 3: P0 = (1 - ρ)/(1 - ρ^4) = 0.5/0.9375
        let r = eval(&Mm1k::new(1.0, 2.0, 3.0)).into_results();
        let p0 = 0.5 / 0.9375;
        assert!(close(r.p0, p0));
        assert!(close(r.probabilities[3], p0 * 0.125));
        let total: f64 = r.probabilities.iter().sum();
        assert!(close(total, 1.0));
    }

    #[test]
    fn test_mm1k_overloaded_is_still_stable() {
        let outcome = eval(&Mm1k::new(10.0, 1.0, 4.0));
        assert!(outcome.is_stable());
        let r = outcome.results();
        assert!(r.blocking > 0.89);
        assert!(r.effective_arrival_rate <= 1.0 + 1e-12);
    }

    #[test]
    fn test_mm1k_delay_tails() {
        let r = eval(&Mm1k::new(1.0, 2.0, 3.0)).into_results();
        // At t = 0 every admitted arrival is still in the system.
        assert!(close(r.prob_system_time_exceeds, 1.0));
        assert!(close(r.prob_queue_time_exceeds + r.prob_no_wait, 1.0));

        let later = eval(&Mm1k::new(1.0, 2.0, 3.0).with_time(2.0)).into_results();
        assert!(later.prob_system_time_exceeds < r.prob_system_time_exceeds);
        assert!(later.prob_queue_time_exceeds <= later.prob_system_time_exceeds);
    }

    #[test]
    fn test_mm1k_capacity_one_has_no_queue() {
        let r = eval(&Mm1k::new(1.0, 1.0, 1.0)).into_results();
        assert_eq!(r.means.lq, 0.0);
        assert_eq!(r.means.wq, 0.0);
        assert!(close(r.prob_no_wait, 1.0));
        assert!(close(r.means.w, 1.0));
    }

    #[test]
    fn test_mm1k_rejects_bad_capacity() {
        let p = Precision::default();
        assert!(matches!(
            Mm1k::new(1.0, 2.0, 0.0).evaluate(&p),
            Err(DomainError::OutOfRange {
                name: "capacity",
                ..
            })
        ));
        assert!(matches!(
            Mm1k::new(1.0, 2.0, 2.5).evaluate(&p),
            Err(DomainError::NotAnInteger {
                name: "capacity",
                ..
            })
        ));
    }

    #[test]
    fn test_mm1n_point_queries() {
        let r = eval(&Mm1n::new(1.0, 2.0, 3.0).with_state(2.0).with_threshold(1.0)).into_results();
        let p0 = 0.5 / 0.9375;
        assert!(close(r.pn, p0 * 0.25));
        assert!(close(r.blocking, p0 * 0.125));
        assert!(close(r.overflow, p0 * (0.25 + 0.125)));
        assert!(close(r.effective_arrival_rate, 1.0 - r.blocking));

        let beyond = eval(&Mm1n::new(1.0, 2.0, 3.0).with_state(7.0)).into_results();
        assert_eq!(beyond.pn, 0.0);
    }

    #[test]
    fn test_mm1_finite_machine_repair() {
        // N = 2, λ = 1, μ = 1: weights 1, 2, 2 (falling factorial), P0 = 1/5
        let r = eval(&Mm1Finite::new(1.0, 1.0, 2.0)).into_results();
        assert!(close(r.p0, 0.2));
        assert!(close(r.probabilities[1], 0.4));
        assert!(close(r.probabilities[2], 0.4));
        assert!(close(r.utilization, 0.8));
        assert!(close(r.means.l, 1.2));
        // λₑ = λ(N - L)
        assert!(close(r.effective_arrival_rate, 0.8));
    }

    #[test]
    fn test_mm1_finite_rejects_empty_population() {
        assert!(matches!(
            Mm1Finite::new(1.0, 1.0, 0.0).evaluate(&Precision::default()),
            Err(DomainError::OutOfRange {
                name: "population",
                ..
            })
        ));
    }

    #[test]
    fn test_mg1_deterministic_service_is_md1() {
        let r = eval(&Mg1::new(2.0, 5.0, 0.0)).into_results();
        let rho = 0.4;
        assert!(close(r.means.lq, rho * rho / (2.0 * (1.0 - rho))));
        assert!(close(r.means.l, r.means.lq + rho));
        assert!(close(r.means.wq, r.means.lq / 2.0));
        assert!(close(r.p0, 0.6));
    }

    #[test]
    fn test_mg1_exponential_service_matches_mm1() {
        let mg1 = eval(&Mg1::new(2.0, 5.0, 0.2)).into_results();
        let mm1 = eval(&Mm1::new(2.0, 5.0)).into_results();
        assert!(close(mg1.means.lq, mm1.means.lq));
        assert!(close(mg1.means.w, mm1.means.w));
    }

    #[test]
    fn test_mg1_rejects_instability() {
        assert_eq!(
            Mg1::new(5.0, 5.0, 0.1).evaluate(&Precision::default()),
            Err(DomainError::Unstable {
                model: "M/G/1",
                rho: 1.0
            })
        );
    }
}
