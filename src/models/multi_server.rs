//! Multi-server models: M/M/s, M/M/s/K, M/M/s//N.
//!
//! With `a = λ/μ` and `ρ = a/s`, state weights are `a^n/n!` below `s` and
//! `a^s/s! · ρ^(n-s)` from `s` upward. The unbounded model sums the boundary
//! states explicitly and closes the tail geometrically; the bounded models
//! run the shared birth–death recurrence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{count, non_negative, outcome, rate, ModelKind, QueueModel};
use crate::combinatorics::{erlang_b, erlang_survival};
use crate::error::DomainError;
use crate::metrics::{Evaluation, MeanMetrics, MeanValues};
use crate::occupancy::{Distribution, OccupancyPolicy, SteadyState};
use crate::precision::{Precision, Real};

// =============================================================================
// Erlang-C core
// =============================================================================

/// Boundary states `0..=s` of the M/M/s chain in units of the service rate,
/// so the weights are `a^n/n!`.
#[derive(Debug, Clone, Copy)]
struct Boundary {
    load: Real,
    servers: usize,
}

impl OccupancyPolicy for Boundary {
    fn model(&self) -> &'static str {
        "M/M/s"
    }

    fn servers(&self) -> usize {
        self.servers
    }

    fn service_rate(&self) -> Real {
        Real::ONE
    }

    fn max_state(&self) -> usize {
        self.servers
    }

    fn arrival_rate(&self, _n: usize) -> Real {
        self.load
    }
}

/// Steady-state core of an M/M/s queue with `ρ < 1`.
///
/// Shared with the priority models, which evaluate it for the aggregate
/// stream of each class prefix.
#[derive(Debug, Clone)]
pub(crate) struct ErlangCore {
    /// `P(N = n)` for `n = 0..=s`.
    pub boundary: Vec<Real>,
    /// Empty-system probability.
    pub p0: Real,
    /// Erlang-C delay probability `P(all servers busy)`.
    pub delay: Real,
    /// Mean queue length.
    pub lq: Real,
}

impl ErlangCore {
    /// Solve for offered load `a` on `servers` servers.
    ///
    /// The delay probability comes from Erlang B as `C = B / (1 - ρ(1 - B))`;
    /// state probabilities come from the rescaled boundary weights, divided
    /// by their peak so the geometric tail `w(s)/(1 - ρ)` stays in range.
    ///
    /// # Errors
    ///
    /// Returns `ZeroDenominator` at `ρ = 1`.
    pub fn solve(a: Real, servers: usize) -> Result<Self, DomainError> {
        let rho = a / Real::from(servers);
        let idle = Real::ONE - rho;

        let blocking = erlang_b(a, servers);
        let delay = (blocking / (Real::ONE - rho * (Real::ONE - blocking))).finite("Erlang C")?;
        let lq = (delay * rho / idle).finite("Lq")?;

        let weights = Boundary { load: a, servers }.unnormalized();
        let peak = weights.iter().copied().fold(Real::ZERO, Real::max);
        let scaled: Vec<Real> = weights.iter().map(|w| *w / peak).collect();
        let below: Real = scaled[..servers].iter().sum();
        let constant = below + scaled[servers] / idle;
        let boundary = scaled
            .iter()
            .map(|w| (*w / constant).finite("P0"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            p0: boundary[0],
            boundary,
            delay,
            lq,
        })
    }

    /// `P(N = n)`.
    pub fn probability(&self, n: usize, rho: Real) -> Real {
        let servers = self.boundary.len() - 1;
        if n < servers {
            self.boundary[n]
        } else {
            self.boundary[servers] * rho.powu((n - servers) as u64)
        }
    }
}

// =============================================================================
// M/M/s
// =============================================================================

/// M/M/s: Poisson arrivals, `s` exponential servers, unlimited queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mms {
    /// Arrival rate `λ`.
    #[serde(alias = "lambda")]
    pub arrival_rate: f64,
    /// Service rate `μ` of one server.
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// Number of servers `s`.
    #[serde(alias = "s")]
    pub servers: f64,
    /// Query state `n` for `Pn`.
    #[serde(default, alias = "n")]
    pub state: f64,
    /// Horizon `t` for the delay tails.
    #[serde(default, alias = "t")]
    pub time: f64,
}

impl Mms {
    /// Create a record with all queries at zero.
    #[must_use]
    pub const fn new(arrival_rate: f64, service_rate: f64, servers: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            servers,
            state: 0.0,
            time: 0.0,
        }
    }

    /// Set the query state `n`.
    #[must_use]
    pub const fn with_state(mut self, n: f64) -> Self {
        self.state = n;
        self
    }

    /// Set the horizon `t`.
    #[must_use]
    pub const fn with_time(mut self, t: f64) -> Self {
        self.time = t;
        self
    }
}

/// M/M/s results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MmsResults {
    /// Utilization `λ/(sμ)`.
    pub rho: f64,
    /// `P(N = 0)`.
    pub p0: f64,
    /// `P(N = n)` at the query state.
    pub pn: f64,
    /// Erlang-C probability that an arrival waits.
    pub delay_probability: f64,
    /// Mean values.
    #[serde(flatten)]
    pub means: MeanMetrics,
    /// `P(Wq = 0)`.
    pub prob_no_wait: f64,
    /// `P(Wq > t)`.
    pub prob_queue_time_exceeds: f64,
    /// `P(W > t)`.
    pub prob_system_time_exceeds: f64,
}

impl QueueModel for Mms {
    type Output = MmsResults;
    const KIND: ModelKind = ModelKind::Mms;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<MmsResults>, DomainError> {
        let lambda = rate("arrival_rate", self.arrival_rate)?;
        let mu = rate("service_rate", self.service_rate)?;
        let servers = count("servers", self.servers, 1)?;
        let n = count("state", self.state, 0)?;
        let t = non_negative("time", self.time)?;
        let a = (lambda / mu).finite("offered load")?;
        let s = Real::from(servers);
        let rho = (a / s).finite("rho")?;
        debug!(model = Self::KIND.notation(), rho = %rho, servers, "evaluating");

        if rho >= Real::ONE {
            let results = MmsResults {
                rho: precision.report(rho, "rho")?,
                p0: 0.0,
                pn: 0.0,
                delay_probability: 1.0,
                means: MeanMetrics::UNBOUNDED,
                prob_no_wait: 0.0,
                prob_queue_time_exceeds: 1.0,
                prob_system_time_exceeds: 1.0,
            };
            return Ok(outcome(Self::KIND, rho, false, results));
        }

        let core = ErlangCore::solve(a, servers)?;
        let means = MeanValues::from_queue_length(core.lq, lambda, mu);

        let no_wait = Real::ONE - core.delay;
        let drain = s * mu * (Real::ONE - rho);
        let drain_tail = erlang_survival(1, drain, t);
        let queue_tail = core.delay * drain_tail;

        // P(W > t) mixes an immediate service with a queued one; the two
        // exponentials coincide when s - 1 - a vanishes, leaving an
        // Erlang(2, μ) tail for delayed customers.
        let service_tail = erlang_survival(1, mu, t);
        let gap = s - Real::ONE - a;
        let system_tail = if precision.is_negligible(gap) {
            no_wait * service_tail + core.delay * erlang_survival(2, mu, t)
        } else {
            service_tail + core.delay * (service_tail - drain_tail) / gap
        };

        let results = MmsResults {
            rho: precision.report(rho, "rho")?,
            p0: precision.report(core.p0, "P0")?,
            pn: precision.report(core.probability(n, rho), "Pn")?,
            delay_probability: precision.report(core.delay, "Erlang C")?,
            means: means.report(precision)?,
            prob_no_wait: precision.report(no_wait, "P(Wq=0)")?,
            prob_queue_time_exceeds: precision.report(queue_tail, "P(Wq>t)")?,
            prob_system_time_exceeds: precision.report(system_tail, "P(W>t)")?,
        };
        Ok(outcome(Self::KIND, rho, true, results))
    }
}

// =============================================================================
// M/M/s/K
// =============================================================================

/// Below this `m·(1-ρ)` the M/M/s/K bracket loses more than half its digits.
fn closed_form_floor() -> Real {
    Real::Finite(Decimal::new(1, 6))
}

/// `s` servers sharing a system capacity of `K`.
#[derive(Debug, Clone, Copy)]
struct FiniteCapacity {
    lambda: Real,
    mu: Real,
    servers: usize,
    capacity: usize,
}

impl OccupancyPolicy for FiniteCapacity {
    fn model(&self) -> &'static str {
        "M/M/s/K"
    }

    fn servers(&self) -> usize {
        self.servers
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

    /// `Lq = P0·a^s·ρ / (s!(1-ρ)²) · [1 - ρ^m - m·ρ^m·(1-ρ)]`, `m = K - s`.
    fn queue_length(&self, distribution: &Distribution) -> Real {
        let s = Real::from(self.servers);
        let a = self.lambda / self.mu;
        let rho = a / s;
        let idle = Real::ONE - rho;
        let m = self.capacity - self.servers;
        // The bracket is of order (m·(1-ρ))², so it cancels to noise as
        // m·(1-ρ) shrinks; overloaded chains may also have rescaled P(s) to
        // zero. Both fall back to the direct sum.
        if Real::from(m) * idle < closed_form_floor() {
            return distribution.excess_mean(self.servers);
        }
        let rho_m = rho.powu(m as u64);
        let bracket = Real::ONE - rho_m - Real::from(m) * rho_m * idle;
        // P(s) = P0·a^s/s!, read off the distribution so rescaling cancels.
        let closed = distribution.probability(self.servers) * rho / (idle * idle) * bracket;
        if closed.is_finite() {
            closed
        } else {
            distribution.excess_mean(self.servers)
        }
    }
}

/// M/M/s/K: `s` servers, at most `K ≥ s` customers in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mmsk {
    /// Arrival rate `λ`.
    #[serde(alias = "lambda")]
    pub arrival_rate: f64,
    /// Service rate `μ` of one server.
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// Number of servers `s`.
    #[serde(alias = "s")]
    pub servers: f64,
    /// System capacity `K`.
    #[serde(alias = "k")]
    pub capacity: f64,
    /// Horizon `t` for the delay tail.
    #[serde(default, alias = "t")]
    pub time: f64,
}

impl Mmsk {
    /// Create a record with `t = 0`.
    #[must_use]
    pub const fn new(arrival_rate: f64, service_rate: f64, servers: f64, capacity: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            servers,
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

/// M/M/s/K results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MmskResults {
    /// Offered utilization `λ/(sμ)`.
    pub rho: f64,
    /// `P(N = 0)`.
    pub p0: f64,
    /// `P(N = n)` for `n = 0..=K`.
    pub probabilities: Vec<f64>,
    /// Blocking probability `P(N = K)`.
    pub blocking: f64,
    /// Admitted throughput.
    pub effective_arrival_rate: f64,
    /// Mean values.
    #[serde(flatten)]
    pub means: MeanMetrics,
    /// `P(Wq = 0)` for admitted arrivals.
    pub prob_no_wait: f64,
    /// `P(Wq > t)` for admitted arrivals.
    pub prob_queue_time_exceeds: f64,
}

impl QueueModel for Mmsk {
    type Output = MmskResults;
    const KIND: ModelKind = ModelKind::Mmsk;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<MmskResults>, DomainError> {
        let lambda = rate("arrival_rate", self.arrival_rate)?;
        let mu = rate("service_rate", self.service_rate)?;
        let servers = count("servers", self.servers, 1)?;
        let capacity = count("capacity", self.capacity, 1)?;
        if capacity < servers {
            return Err(DomainError::CapacityBelowServers { capacity, servers });
        }
        let t = non_negative("time", self.time)?;
        let s = Real::from(servers);
        let rho = (lambda / (s * mu)).finite("rho")?;
        debug!(model = Self::KIND.notation(), rho = %rho, servers, capacity, "evaluating");

        let policy = FiniteCapacity {
            lambda,
            mu,
            servers,
            capacity,
        };
        let state = SteadyState::solve(&policy)?;
        let dist = &state.distribution;

        let no_wait: Real = state.arrival_view.iter().take(servers).sum();
        // An admitted arrival finding j ≥ s waits j - s + 1 completions at rate sμ.
        let drain = s * mu;
        let queue_tail = state.arrival_survival(t, |j| {
            if j < servers {
                (0, drain)
            } else {
                ((j - servers + 1) as u64, drain)
            }
        });

        let results = MmskResults {
            rho: precision.report(rho, "rho")?,
            p0: precision.report(dist.probability(0), "P0")?,
            probabilities: precision.report_all(dist.probabilities(), "Pn")?,
            blocking: precision.report(dist.probability(capacity), "P(N=K)")?,
            effective_arrival_rate: precision.report(state.throughput, "effective arrival rate")?,
            means: state.means.report(precision)?,
            prob_no_wait: precision.report(no_wait, "P(Wq=0)")?,
            prob_queue_time_exceeds: precision.report(queue_tail, "P(Wq>t)")?,
        };
        Ok(outcome(Self::KIND, rho, true, results))
    }
}

// =============================================================================
// M/M/s//N
// =============================================================================

/// `N` sources, each arriving at rate `λ` while outside the system.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FiniteSource {
    pub lambda: Real,
    pub mu: Real,
    pub servers: usize,
    pub population: usize,
}

impl OccupancyPolicy for FiniteSource {
    fn model(&self) -> &'static str {
        "M/M/s//N"
    }

    fn servers(&self) -> usize {
        self.servers
    }

    fn service_rate(&self) -> Real {
        self.mu
    }

    fn max_state(&self) -> usize {
        self.population
    }

    fn arrival_rate(&self, n: usize) -> Real {
        Real::from(self.population.saturating_sub(n)) * self.lambda
    }
}

/// M/M/s with a finite population of `N` sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MmsFinite {
    /// Arrival rate `λ` of one idle source.
    #[serde(alias = "lambda")]
    pub arrival_rate: f64,
    /// Service rate `μ` of one server.
    #[serde(alias = "mu")]
    pub service_rate: f64,
    /// Number of servers `s`.
    #[serde(alias = "s")]
    pub servers: f64,
    /// Population size `N`.
    #[serde(alias = "n_sources")]
    pub population: f64,
}

impl MmsFinite {
    /// Create a record.
    #[must_use]
    pub const fn new(arrival_rate: f64, service_rate: f64, servers: f64, population: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            servers,
            population,
        }
    }
}

/// M/M/s//N results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MmsFiniteResults {
    /// Per-source load `λ/μ`.
    pub rho: f64,
    /// `P(N = 0)`.
    pub p0: f64,
    /// `P(N = n)` for `n = 0..=N`.
    pub probabilities: Vec<f64>,
    /// Admitted throughput `Σ (N - n)λ·Pn`.
    pub effective_arrival_rate: f64,
    /// Server utilization `λₑ/(sμ)`.
    pub utilization: f64,
    /// `P(N ≥ s)`.
    pub prob_all_busy: f64,
    /// Mean values.
    #[serde(flatten)]
    pub means: MeanMetrics,
}

impl QueueModel for MmsFinite {
    type Output = MmsFiniteResults;
    const KIND: ModelKind = ModelKind::MmsFinite;

    fn evaluate(&self, precision: &Precision) -> Result<Evaluation<MmsFiniteResults>, DomainError> {
        let lambda = rate("arrival_rate", self.arrival_rate)?;
        let mu = rate("service_rate", self.service_rate)?;
        let servers = count("servers", self.servers, 1)?;
        let population = count("population", self.population, 1)?;
        let rho = (lambda / mu).finite("rho")?;
        debug!(model = Self::KIND.notation(), rho = %rho, servers, population, "evaluating");

        let policy = FiniteSource {
            lambda,
            mu,
            servers,
            population,
        };
        let state = SteadyState::solve(&policy)?;
        let dist = &state.distribution;
        let utilization = state.throughput / (Real::from(servers) * mu);

        let results = MmsFiniteResults {
            rho: precision.report(rho, "rho")?,
            p0: precision.report(dist.probability(0), "P0")?,
            probabilities: precision.report_all(dist.probabilities(), "Pn")?,
            effective_arrival_rate: precision.report(state.throughput, "effective arrival rate")?,
            utilization: precision.report(utilization, "utilization")?,
            prob_all_busy: precision.report(Real::ONE - dist.mass_below(servers), "P(N>=s)")?,
            means: state.means.report(precision)?,
        };
        Ok(outcome(Self::KIND, rho, true, results))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Little's-law identities hold exactly for stable M/M/s.
        #[test]
        fn prop_mms_littles_law(servers in 1u32..12, rho in 0.05f64..0.95, mu in 0.5f64..5.0) {
            let lambda = rho * f64::from(servers) * mu;
            let r = Mms::new(lambda, mu, f64::from(servers))
                .evaluate(&Precision::default())
                .expect("valid")
                .into_results();
            prop_assert!((r.means.w - r.means.wq - 1.0 / mu).abs() < 1e-12 * r.means.w.max(1.0));
            prop_assert!((r.means.l - r.means.lq - lambda / mu).abs() < 1e-12 * r.means.l.max(1.0));
            prop_assert!(r.delay_probability >= 0.0 && r.delay_probability <= 1.0);
        }

        /// M/M/s/K occupancy sums to one, including overloaded systems.
        #[test]
        fn prop_mmsk_distribution_sums_to_one(
            servers in 1u32..8,
            extra in 0u32..60,
            lambda in 0.1f64..30.0,
            mu in 0.1f64..5.0,
        ) {
            let capacity = servers + extra;
            let r = Mmsk::new(lambda, mu, f64::from(servers), f64::from(capacity))
                .evaluate(&Precision::default())
                .expect("valid")
                .into_results();
            let total: f64 = r.probabilities.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
        }

        /// With a deep buffer M/M/s/K approaches M/M/s.
        #[test]
        fn prop_mmsk_converges_to_mms(servers in 1u32..6, rho in 0.05f64..0.6) {
            let mu = 1.0;
            let lambda = rho * f64::from(servers);
            let s = f64::from(servers);
            let bounded = Mmsk::new(lambda, mu, s, s + 300.0)
                .evaluate(&Precision::default())
                .expect("valid")
                .into_results();
            let unbounded = Mms::new(lambda, mu, s)
                .evaluate(&Precision::default())
                .expect("valid")
                .into_results();
            prop_assert!((bounded.p0 - unbounded.p0).abs() < 1e-12);
            prop_assert!((bounded.means.lq - unbounded.means.lq).abs() < 1e-9);
        }
    }
}
