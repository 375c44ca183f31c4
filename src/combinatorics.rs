//! Combinatorial helpers.
//!
//! Factorials and Erlang-type sums in decimal arithmetic. Sums and
//! recurrences are formed incrementally so intermediate values stay near the
//! magnitude of the result instead of passing through `n!` or `a^n`.

use rust_decimal::Decimal;

use crate::error::DomainError;
use crate::precision::Real;

/// Partial sums above this are rescaled by a chunk of the pending `e^-x` factor.
const RESCALE_ABOVE: Real = Real::Finite(Decimal::from_parts(1_000_000_000, 0, 0, false, 0));

/// Exponent chunk applied per rescale; `e^-27` is about `1.9e-12`.
const RESCALE_CHUNK: Real = Real::Finite(Decimal::from_parts(27, 0, 0, false, 0));

/// Poisson mean beyond which `P(N < k)` is below decimal resolution.
const NEGLIGIBLE_MARGIN: u64 = 200;

/// Integer factorial `n!`.
///
/// # Errors
///
/// Returns `Negative` for `n < 0`, `NotAnInteger` for fractional `n`, and
/// `Overflow` once `n!` leaves the decimal range (`n > 27`).
///
/// # Examples
///
/// ```rust
/// use qtheory::combinatorics::factorial;
/// use qtheory::precision::Real;
///
/// assert_eq!(factorial(Real::from(5_u64)).unwrap(), Real::from(120_u64));
/// assert!(factorial(Real::ratio_of(5, 2)).is_err());
/// ```
pub fn factorial(n: Real) -> Result<Real, DomainError> {
    let n = n.finite("n")?;
    if n.is_negative() {
        return Err(DomainError::negative("n", n.to_f64()));
    }
    if !n.is_integer() {
        return Err(DomainError::not_an_integer("n", n.to_f64()));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let upper = n.to_f64() as u64;
    (1..=upper)
        .map(Real::from)
        .fold(Real::ONE, |acc, i| acc * i)
        .finite("n!")
}

/// Erlang-B blocking probability of `servers` servers offered `a` Erlangs.
///
/// Runs the recurrence `B(k) = a·B(k-1) / (k + a·B(k-1))` from `B(0) = 1`.
/// Every step stays in `[0, 1]`, so loads far beyond the range of `a^s/s!`
/// remain exact to the decimal resolution.
#[must_use]
pub fn erlang_b(a: Real, servers: usize) -> Real {
    (1..=servers).fold(Real::ONE, |b, k| {
        let offered = a * b;
        offered / (Real::from(k) + offered)
    })
}

/// Survival function of an Erlang distribution with `k` stages of rate `rate`.
///
/// `P(Erlang(k, rate) > t) = e^(-rate·t) · Σ_{i<k} (rate·t)^i / i!`
///
/// With zero stages the function returns `1`; callers conditioning on the
/// number of customers present only sum over states with at least one stage.
/// Negative `t` also returns `1`.
///
/// The exponential factor is folded into the running sum in chunks whenever
/// the partial sum grows large, so `rate·t` in the thousands neither
/// underflows `e^-x` nor overflows `x^i / i!`.
#[must_use]
pub fn erlang_survival(k: u64, rate: Real, t: Real) -> Real {
    if k == 0 || !t.is_positive() {
        return Real::ONE;
    }
    let x = rate * t;
    if !x.is_finite() {
        // A positive rate over a horizon past the decimal range leaves nothing
        return if rate.is_positive() { Real::ZERO } else { x };
    }
    if x > Real::from(k.saturating_mul(2).saturating_add(NEGLIGIBLE_MARGIN)) {
        return Real::ZERO;
    }

    let mut pending = x;
    let mut term = Real::ONE;
    let mut sum = Real::ONE;
    for i in 1..k {
        term = term * x / Real::from(i);
        sum = sum + term;
        while term > RESCALE_ABOVE && pending.is_positive() {
            let chunk = pending.min(RESCALE_CHUNK);
            let factor = (-chunk).exp();
            term = term * factor;
            sum = sum * factor;
            pending = pending - chunk;
        }
    }
    (sum * (-pending).exp()).min(Real::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(x: f64) -> Real {
        Real::from_f64("x", x).expect("finite")
    }

    fn close(a: Real, b: f64, tol: f64) -> bool {
        (a.to_f64() - b).abs() <= tol
    }

    #[test]
    fn test_factorial_values() {
        assert_eq!(factorial(Real::ZERO), Ok(Real::ONE));
        assert_eq!(factorial(Real::ONE), Ok(Real::ONE));
        assert_eq!(factorial(Real::from(10_u64)), Ok(Real::from(3_628_800_u64)));
        assert!(factorial(Real::from(27_u64)).is_ok());
    }

    #[test]
    fn test_factorial_domain_errors() {
        assert_eq!(
            factorial(real(-1.0)),
            Err(DomainError::Negative {
                name: "n",
                value: -1.0
            })
        );
        assert_eq!(
            factorial(real(2.5)),
            Err(DomainError::NotAnInteger {
                name: "n",
                value: 2.5
            })
        );
        assert_eq!(
            factorial(Real::from(40_u64)),
            Err(DomainError::Overflow { quantity: "n!" })
        );
    }

    #[test]
    fn test_erlang_b_small_systems() {
        assert_eq!(erlang_b(real(2.0), 0), Real::ONE);
        // B(1, a) = a/(1+a)
        assert!(close(erlang_b(real(2.0), 1), 2.0 / 3.0, 1e-15));
        // a = 2, s = 3: (8/6) / (1 + 2 + 2 + 8/6) = 4/19
        assert!(close(erlang_b(real(2.0), 3), 4.0 / 19.0, 1e-15));
    }

    #[test]
    fn test_erlang_b_heavy_load_stays_in_range() {
        // a^s/s! alone overflows the decimal range here
        let b = erlang_b(real(100.0), 120);
        assert!(b.is_finite());
        assert!(b.to_f64() > 0.0 && b.to_f64() < 0.01);
        assert!(erlang_b(real(5000.0), 5000).is_finite());
    }

    #[test]
    fn test_erlang_survival_degenerate_cases() {
        assert_eq!(erlang_survival(0, real(2.0), real(1.0)), Real::ONE);
        assert_eq!(erlang_survival(3, real(2.0), Real::ZERO), Real::ONE);
        assert_eq!(erlang_survival(3, real(2.0), real(-1.0)), Real::ONE);
    }

    #[test]
    fn test_erlang_survival_single_stage_is_exponential() {
        let s = erlang_survival(1, real(3.0), real(0.5));
        assert!(close(s, (-1.5_f64).exp(), 1e-15));
    }

    #[test]
    fn test_erlang_survival_two_stages() {
        // P(Erlang(2, μ) > t) = e^(-μt)(1 + μt)
        let s = erlang_survival(2, real(2.0), real(1.0));
        assert!(close(s, (-2.0_f64).exp() * 3.0, 1e-15));
    }

    #[test]
    fn test_erlang_survival_large_argument() {
        // Mean 500 stages at rate 1: median near 499.67
        let s = erlang_survival(500, real(1.0), real(499.67));
        assert!(s.is_finite());
        assert!(close(s, 0.5, 0.01), "got {s}");

        // Far past the mean the survival vanishes
        assert_eq!(erlang_survival(5, real(1.0), real(10_000.0)), Real::ZERO);
        let tiny = erlang_survival(5, real(1.0), real(150.0));
        assert!(tiny.to_f64() < 1e-28);
    }

    #[test]
    fn test_erlang_survival_horizon_past_decimal_range() {
        // rate·t = 1e30 cannot be represented, but the tail is plainly zero
        assert_eq!(erlang_survival(1, real(1e10), real(1e20)), Real::ZERO);
        assert_eq!(erlang_survival(3, real(1e10), real(1e20)), Real::ZERO);
        let poisoned = Real::ONE / Real::ZERO;
        assert!(!erlang_survival(1, poisoned, real(1.0)).is_finite());
    }

    #[test]
    fn test_erlang_survival_monotone_in_stages() {
        let rate = real(1.5);
        let t = real(2.0);
        let mut prev = Real::ZERO;
        for k in 1..20 {
            let s = erlang_survival(k, rate, t);
            assert!(s >= prev);
            prev = s;
        }
        assert!(prev <= Real::ONE);
    }
}
