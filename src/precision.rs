//! Precision arithmetic layer.
//!
//! All model computation runs on [`Real`], a decimal value backed by
//! `rust_decimal` (96-bit mantissa, 28 significant digits). Formulas that
//! divide by `1 - ρ` or `1 - ρ^K` keep their relative precision near the
//! stability boundary, where binary floating point loses it first.
//!
//! Arithmetic never panics. Overflow and division by zero poison the value
//! (like NaN), and evaluators convert back to a checked value with
//! [`Real::finite`] at the points where a quantity is named:
//!
//! ```rust
//! use qtheory::precision::Real;
//!
//! let rho = Real::ratio_of(2, 5);
//! let l = rho / (Real::ONE - rho);
//! assert!((l.finite("L").unwrap().to_f64() - 2.0 / 3.0).abs() < 1e-15);
//!
//! let bad = Real::ONE / Real::ZERO;
//! assert!(bad.finite("L").is_err());
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::error::DomainError;

/// Below this exponent `e^x` is smaller than the smallest representable decimal.
const EXP_UNDERFLOW: Decimal = dec!(-64);

/// Maximum significant digits a decimal can carry.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 28;

/// Why a [`Real`] stopped being a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Result exceeded the decimal range.
    Overflow,
    /// Division by exact zero.
    DivideByZero,
}

/// Decimal real number with sticky faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Real {
    /// A representable value.
    Finite(Decimal),
    /// A poisoned value; every operation involving it stays poisoned.
    Invalid(Fault),
}

impl Real {
    /// Zero.
    pub const ZERO: Self = Self::Finite(Decimal::ZERO);
    /// One.
    pub const ONE: Self = Self::Finite(Decimal::ONE);
    /// Two.
    pub const TWO: Self = Self::Finite(Decimal::TWO);

    /// Convert a caller-supplied float, rejecting NaN and infinities.
    ///
    /// # Errors
    ///
    /// Returns `NotFinite` for NaN/∞ and `Overflow` when the magnitude exceeds
    /// the decimal range.
    pub fn from_f64(name: &'static str, value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::NotFinite { name });
        }
        Decimal::from_f64(value)
            .map(Self::Finite)
            .ok_or(DomainError::overflow(name))
    }

    /// Exact ratio of two integers.
    #[must_use]
    pub fn ratio_of(numerator: i64, denominator: i64) -> Self {
        Self::from(numerator) / Self::from(denominator)
    }

    /// Check the value is a number, naming the quantity in the error.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` or `ZeroDenominator` depending on what poisoned it.
    pub const fn finite(self, quantity: &'static str) -> Result<Self, DomainError> {
        match self {
            Self::Finite(_) => Ok(self),
            Self::Invalid(Fault::Overflow) => Err(DomainError::overflow(quantity)),
            Self::Invalid(Fault::DivideByZero) => Err(DomainError::zero_denominator(quantity)),
        }
    }

    /// Underlying decimal, if the value is a number.
    #[must_use]
    pub const fn decimal(self) -> Option<Decimal> {
        match self {
            Self::Finite(d) => Some(d),
            Self::Invalid(_) => None,
        }
    }

    /// Nearest `f64`; poisoned values map to NaN.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.decimal().and_then(|d| d.to_f64()).unwrap_or(f64::NAN)
    }

    /// Whether the value is a number.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        matches!(self, Self::Finite(_))
    }

    /// Exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.decimal().is_some_and(|d| d.is_zero())
    }

    /// Strictly below zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.decimal().is_some_and(|d| d.is_sign_negative() && !d.is_zero())
    }

    /// Strictly above zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.decimal().is_some_and(|d| d.is_sign_positive() && !d.is_zero())
    }

    /// Has no fractional part.
    #[must_use]
    pub fn is_integer(self) -> bool {
        self.decimal().is_some_and(|d| d.fract().is_zero())
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        self.map(|d| Some(d.abs()))
    }

    /// Smaller of two values. A poisoned operand poisons the result.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.min(b)),
            (Self::Invalid(f), _) | (_, Self::Invalid(f)) => Self::Invalid(f),
        }
    }

    /// Larger of two values. A poisoned operand poisons the result.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.max(b)),
            (Self::Invalid(f), _) | (_, Self::Invalid(f)) => Self::Invalid(f),
        }
    }

    /// Integer power `self^n` (negative `n` allowed).
    #[must_use]
    pub fn powi(self, n: i64) -> Self {
        if n < 0 && self.is_zero() {
            return Self::Invalid(Fault::DivideByZero);
        }
        self.map(|d| d.checked_powi(n))
    }

    /// Non-negative integer power `self^n`.
    #[must_use]
    pub fn powu(self, n: u64) -> Self {
        self.map(|d| d.checked_powu(n))
    }

    /// Real power `self^exponent` for a positive base (any base for integral exponents).
    #[must_use]
    pub fn powr(self, exponent: Self) -> Self {
        match (self, exponent) {
            (Self::Finite(_), Self::Finite(e)) => {
                if e.fract().is_zero() {
                    if let Some(n) = e.to_i64() {
                        return self.powi(n);
                    }
                }
                if !self.is_positive() {
                    return Self::Invalid(Fault::Overflow);
                }
                (exponent * self.ln()).exp()
            }
            (Self::Invalid(f), _) | (_, Self::Invalid(f)) => Self::Invalid(f),
        }
    }

    /// Natural exponential `e^self`.
    ///
    /// Arguments far below zero underflow to exactly zero instead of faulting.
    #[must_use]
    pub fn exp(self) -> Self {
        match self {
            Self::Finite(x) if x < EXP_UNDERFLOW => Self::ZERO,
            _ => self.map(|x| x.checked_exp()),
        }
    }

    /// Natural logarithm of a positive value.
    #[must_use]
    pub fn ln(self) -> Self {
        self.map(|x| x.checked_ln())
    }

    fn map(self, f: impl FnOnce(Decimal) -> Option<Decimal>) -> Self {
        match self {
            Self::Finite(d) => f(d).map_or(Self::Invalid(Fault::Overflow), Self::Finite),
            invalid @ Self::Invalid(_) => invalid,
        }
    }

    fn zip(
        self,
        other: Self,
        f: impl FnOnce(Decimal, Decimal) -> Option<Decimal>,
        fault: Fault,
    ) -> Self {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => {
                f(a, b).map_or(Self::Invalid(fault), Self::Finite)
            }
            (Self::Invalid(f), _) | (_, Self::Invalid(f)) => Self::Invalid(f),
        }
    }
}

impl Default for Real {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Decimal> for Real {
    fn from(d: Decimal) -> Self {
        Self::Finite(d)
    }
}

impl From<i64> for Real {
    fn from(n: i64) -> Self {
        Self::Finite(Decimal::from(n))
    }
}

impl From<u64> for Real {
    fn from(n: u64) -> Self {
        Self::Finite(Decimal::from(n))
    }
}

impl From<usize> for Real {
    fn from(n: usize) -> Self {
        Self::Finite(Decimal::from(n))
    }
}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl Add for Real {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a.checked_add(b), Fault::Overflow)
    }
}

impl Sub for Real {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a.checked_sub(b), Fault::Overflow)
    }
}

impl Mul for Real {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a.checked_mul(b), Fault::Overflow)
    }
}

impl Div for Real {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            return match self {
                Self::Invalid(f) => Self::Invalid(f),
                Self::Finite(_) => Self::Invalid(Fault::DivideByZero),
            };
        }
        self.zip(rhs, |a, b| a.checked_div(b), Fault::Overflow)
    }
}

impl Neg for Real {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|d| Some(-d))
    }
}

impl Sum for Real {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Self> for Real {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(d) => write!(f, "{d}"),
            Self::Invalid(Fault::Overflow) => write!(f, "overflow"),
            Self::Invalid(Fault::DivideByZero) => write!(f, "div0"),
        }
    }
}

// =============================================================================
// Precision context
// =============================================================================

/// Reporting precision and negligibility threshold.
///
/// `significant_digits` bounds the digits carried into reported values;
/// `tolerance_digits` sets `ε = 10^-tolerance_digits`, below which a quantity
/// is treated as zero (used to pick limiting forms of closed expressions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    significant_digits: u32,
    tolerance_digits: u32,
}

impl Precision {
    /// Create a precision context. Both values are clamped to `1..=28`.
    #[must_use]
    pub fn new(significant_digits: u32, tolerance_digits: u32) -> Self {
        Self {
            significant_digits: significant_digits.clamp(1, MAX_SIGNIFICANT_DIGITS),
            tolerance_digits: tolerance_digits.clamp(1, MAX_SIGNIFICANT_DIGITS),
        }
    }

    /// Significant digits carried into reported values.
    #[must_use]
    pub const fn significant_digits(&self) -> u32 {
        self.significant_digits
    }

    /// Exponent of the negligibility threshold.
    #[must_use]
    pub const fn tolerance_digits(&self) -> u32 {
        self.tolerance_digits
    }

    /// Negligibility threshold `10^-tolerance_digits`.
    #[must_use]
    pub fn epsilon(&self) -> Real {
        Real::Finite(Decimal::new(1, self.tolerance_digits))
    }

    /// Whether `|x| < ε`.
    #[must_use]
    pub fn is_negligible(&self, x: Real) -> bool {
        x.abs() < self.epsilon()
    }

    /// Round to the configured significant digits.
    ///
    /// Values that already fit are returned unchanged: `round_sf` pads with
    /// trailing zeros, which pushes tiny values past the maximum scale.
    #[must_use]
    pub fn round(&self, x: Real) -> Real {
        x.map(|d| {
            if significant_digits_of(d) <= self.significant_digits {
                return Some(d);
            }
            d.round_sf(self.significant_digits)
                .filter(|r| r.scale() <= MAX_SIGNIFICANT_DIGITS)
                .or(Some(d))
        })
    }

    /// Round and convert a named quantity for a results record.
    ///
    /// # Errors
    ///
    /// Returns the fault that poisoned `x`, naming `quantity`.
    pub fn report(&self, x: Real, quantity: &'static str) -> Result<f64, DomainError> {
        Ok(self.round(x.finite(quantity)?).to_f64())
    }

    /// Report a sequence of values.
    ///
    /// # Errors
    ///
    /// Returns the first fault met, naming `quantity`.
    pub fn report_all(&self, xs: &[Real], quantity: &'static str) -> Result<Vec<f64>, DomainError> {
        xs.iter().map(|x| self.report(*x, quantity)).collect()
    }
}

/// Digits in the mantissa once trailing zeros are dropped; zero has none.
fn significant_digits_of(d: Decimal) -> u32 {
    d.normalize()
        .mantissa()
        .unsigned_abs()
        .checked_ilog10()
        .map_or(0, |log| log + 1)
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(MAX_SIGNIFICANT_DIGITS, 20)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Addition and subtraction are exact inverses on decimals.
        #[test]
        fn prop_add_sub_roundtrip(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let x = Real::from_f64("a", a).expect("finite");
            let y = Real::from_f64("b", b).expect("finite");
            prop_assert_eq!((x + y) - y, x);
        }

        /// Geometric identity (1 - ρ^n) = (1 - ρ)(1 + ρ + … + ρ^(n-1)).
        #[test]
        fn prop_geometric_identity(rho in 0.01f64..0.99, n in 1u64..40) {
            let r = Real::from_f64("rho", rho).expect("finite");
            let lhs = Real::ONE - r.powu(n);
            let series: Real = (0..n).map(|i| r.powu(i)).sum();
            let rhs = (Real::ONE - r) * series;
            prop_assert!((lhs - rhs).abs() < Real::from_f64("eps", 1e-24).expect("finite"));
        }

        /// exp agrees with f64 exp in the representable range.
        #[test]
        fn prop_exp_matches_float(x in -30.0f64..10.0) {
            let ours = Real::from_f64("x", x).expect("finite").exp().to_f64();
            let reference = x.exp();
            prop_assert!((ours - reference).abs() <= 1e-9 * reference.max(1e-12));
        }
    }
}
