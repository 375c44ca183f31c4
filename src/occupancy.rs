//! Occupancy distributions of finite birth–death chains.
//!
//! Every bounded model (capacity `K` or population `N`) is a birth–death
//! chain on `0..=max_state`. A model supplies its rates through
//! [`OccupancyPolicy`]; the shared skeleton in [`SteadyState::solve`] then
//! runs the recurrence `P(n) = P(n-1)·λ(n-1)/μ(n)`, normalizes, and wires the
//! mean values through Little's law. Policies override a hook only where a
//! closed form is known.

use rust_decimal::Decimal;
use tracing::trace;

use crate::combinatorics::erlang_survival;
use crate::error::DomainError;
use crate::metrics::MeanValues;
use crate::precision::Real;

/// Weights above this are rescaled during the recurrence.
const RESCALE_ABOVE: u64 = 1_000_000_000_000_000_000;

/// Rescale factor paired with [`RESCALE_ABOVE`].
fn rescale_factor() -> Real {
    Real::Finite(Decimal::new(1, 18))
}

/// Rates of a birth–death chain plus optional closed-form shortcuts.
pub trait OccupancyPolicy {
    /// Kendall notation, for logs and errors.
    fn model(&self) -> &'static str;

    /// Number of parallel servers.
    fn servers(&self) -> usize;

    /// Service rate of one server.
    fn service_rate(&self) -> Real;

    /// Highest reachable state (capacity or population).
    fn max_state(&self) -> usize;

    /// Arrival rate while `n` are present.
    fn arrival_rate(&self, n: usize) -> Real;

    /// Departure rate while `n` are present.
    fn departure_rate(&self, n: usize) -> Real {
        Real::from(n.min(self.servers())) * self.service_rate()
    }

    /// Unnormalized state weights `w(0) = 1`, `w(n) = w(n-1)·λ(n-1)/μ(n)`.
    ///
    /// Weights that grow past `1e18` rescale the whole prefix so deep chains
    /// with `λ > μ` stay representable; leading states may underflow to zero.
    fn unnormalized(&self) -> Vec<Real> {
        (1..=self.max_state()).fold(vec![Real::ONE], |mut weights, n| {
            let prev = weights.last().copied().unwrap_or(Real::ONE);
            let next = prev * self.arrival_rate(n - 1) / self.departure_rate(n);
            weights.push(next);
            if next > Real::from(RESCALE_ABOVE) {
                trace!(model = self.model(), state = n, "rescaling occupancy weights");
                let factor = rescale_factor();
                weights.iter_mut().for_each(|w| *w = *w * factor);
            }
            weights
        })
    }

    /// Sum of the weights; policies with a closed form may override.
    fn normalizing_constant(&self, weights: &[Real]) -> Real {
        weights.iter().sum()
    }

    /// Mean number waiting; policies with a closed form may override.
    fn queue_length(&self, distribution: &Distribution) -> Real {
        distribution.excess_mean(self.servers())
    }
}

/// A normalized probability mass function over `0..=max_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    probabilities: Vec<Real>,
}

impl Distribution {
    /// Normalize weights by a constant.
    ///
    /// # Errors
    ///
    /// Returns `ZeroDenominator` or `Overflow` if the constant or any
    /// probability is not a number.
    pub fn normalize(weights: &[Real], constant: Real) -> Result<Self, DomainError> {
        let constant = constant.finite("normalizing constant")?;
        let probabilities = weights
            .iter()
            .map(|w| (*w / constant).finite("state probability"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { probabilities })
    }

    /// All state probabilities, index = number present.
    #[must_use]
    pub fn probabilities(&self) -> &[Real] {
        &self.probabilities
    }

    /// `P(n)`; zero beyond the last state.
    #[must_use]
    pub fn probability(&self, n: usize) -> Real {
        self.probabilities.get(n).copied().unwrap_or(Real::ZERO)
    }

    /// Highest state.
    #[must_use]
    pub fn max_state(&self) -> usize {
        self.probabilities.len().saturating_sub(1)
    }

    /// Total mass (one, up to rounding).
    #[must_use]
    pub fn total(&self) -> Real {
        self.probabilities.iter().sum()
    }

    /// `Σ f(n)·P(n)`.
    pub fn expect(&self, f: impl Fn(usize) -> Real) -> Real {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(n, p)| f(n) * *p)
            .sum()
    }

    /// Mean number present.
    #[must_use]
    pub fn mean(&self) -> Real {
        self.expect(Real::from)
    }

    /// `Σ max(n - s, 0)·P(n)`, the mean number waiting behind `s` servers.
    #[must_use]
    pub fn excess_mean(&self, servers: usize) -> Real {
        self.expect(|n| Real::from(n.saturating_sub(servers)))
    }

    /// `P(N < s)`.
    #[must_use]
    pub fn mass_below(&self, s: usize) -> Real {
        self.probabilities.iter().take(s).sum()
    }

    /// `P(N > r)`.
    #[must_use]
    pub fn tail_above(&self, r: usize) -> Real {
        self.probabilities.iter().skip(r.saturating_add(1)).sum()
    }
}

/// Steady state of a finite chain: distribution, throughput, and mean values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteadyState {
    /// Time-average occupancy distribution.
    pub distribution: Distribution,
    /// Admitted throughput `λₑ = Σ λ(n)·P(n)`.
    pub throughput: Real,
    /// Mean values wired through Little's law.
    pub means: MeanValues,
    /// Distribution seen by admitted arrivals, `λ(n)·P(n)/λₑ`.
    pub arrival_view: Vec<Real>,
}

impl SteadyState {
    /// Run the shared skeleton for a policy.
    ///
    /// # Errors
    ///
    /// Returns the first non-finite intermediate, naming the quantity.
    pub fn solve<P: OccupancyPolicy + ?Sized>(policy: &P) -> Result<Self, DomainError> {
        let weights = policy.unnormalized();
        let constant = policy.normalizing_constant(&weights);
        let distribution = Distribution::normalize(&weights, constant)?;

        let throughput = distribution
            .expect(|n| policy.arrival_rate(n))
            .finite("effective arrival rate")?;
        let lq = policy.queue_length(&distribution).finite("Lq")?;
        let means = MeanValues::from_queue_length(lq, throughput, policy.service_rate());

        let arrival_view = distribution
            .probabilities()
            .iter()
            .enumerate()
            .map(|(n, p)| (policy.arrival_rate(n) * *p / throughput).finite("arrival distribution"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            distribution,
            throughput,
            means,
            arrival_view,
        })
    }

    /// `P(X > t)` where an arrival finding `n` present waits `Erlang(k, rate)`
    /// with `(k, rate) = stages(n)`; `k = 0` means no wait.
    pub fn arrival_survival(&self, t: Real, stages: impl Fn(usize) -> (u64, Real)) -> Real {
        self.arrival_view
            .iter()
            .enumerate()
            .filter_map(|(n, pi)| {
                let (k, rate) = stages(n);
                (k > 0).then(|| *pi * erlang_survival(k, rate, t))
            })
            .sum()
    }
}
