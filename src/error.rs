//! Error types for qtheory.
//!
//! Every evaluator fails fast: it either returns a fully computed result or a
//! `DomainError` describing the first invalid input it met. Nothing here is
//! retryable, since evaluation is pure and deterministic.

use thiserror::Error;

/// Result type alias for qtheory operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Invalid-input conditions for a queueing model.
///
/// One kind covers every way a parameter record can be rejected: bad rates,
/// bad counts, infeasible capacity, and instability for models where
/// `ρ ≥ 1` is a configuration error rather than a reportable state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A rate or count that must be strictly positive was not.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A value that must be non-negative was negative.
    #[error("{name} must be non-negative, got {value}")]
    Negative {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// NaN or infinite input.
    #[error("{name} must be finite")]
    NotFinite {
        /// Parameter name.
        name: &'static str,
    },

    /// A count (servers, capacity, population, index) was fractional.
    #[error("{name} must be an integer, got {value}")]
    NotAnInteger {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A count fell below its lower bound.
    #[error("{name} must be at least {min}, got {value}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
    },

    /// A count exceeded the largest state space the solvers enumerate.
    #[error("{name} must be at most {max}, got {value}")]
    TooLarge {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Inclusive upper bound.
        max: usize,
    },

    /// System capacity cannot hold every server.
    #[error("capacity K={capacity} is smaller than server count s={servers}")]
    CapacityBelowServers {
        /// System capacity K.
        capacity: usize,
        /// Server count s.
        servers: usize,
    },

    /// Utilization at or above one for a model that has no steady state to report.
    #[error("{model} is unstable: rho={rho} >= 1")]
    Unstable {
        /// Kendall notation of the model.
        model: &'static str,
        /// Offered utilization.
        rho: f64,
    },

    /// A denominator vanished while forming a closed-form quantity.
    #[error("zero denominator while computing {quantity}")]
    ZeroDenominator {
        /// Quantity being computed.
        quantity: &'static str,
    },

    /// An intermediate exceeded the range of the decimal representation.
    #[error("decimal range exceeded while computing {quantity}")]
    Overflow {
        /// Quantity being computed.
        quantity: &'static str,
    },

    /// Priority model given no classes.
    #[error("priority model requires at least one class")]
    EmptyClasses,

    /// Parameter record does not belong to the requested model.
    #[error("expected parameters for {expected}, found {found}")]
    ModelMismatch {
        /// Requested model.
        expected: &'static str,
        /// Model the parameters describe.
        found: &'static str,
    },
}

impl DomainError {
    /// Create a non-positive parameter error.
    #[must_use]
    pub const fn non_positive(name: &'static str, value: f64) -> Self {
        Self::NonPositive { name, value }
    }

    /// Create a negative parameter error.
    #[must_use]
    pub const fn negative(name: &'static str, value: f64) -> Self {
        Self::Negative { name, value }
    }

    /// Create a non-integer count error.
    #[must_use]
    pub const fn not_an_integer(name: &'static str, value: f64) -> Self {
        Self::NotAnInteger { name, value }
    }

    /// Create a decimal overflow error.
    #[must_use]
    pub const fn overflow(quantity: &'static str) -> Self {
        Self::Overflow { quantity }
    }

    /// Create a zero-denominator error.
    #[must_use]
    pub const fn zero_denominator(quantity: &'static str) -> Self {
        Self::ZeroDenominator { quantity }
    }
}

/// Unified error type for all qtheory operations.
#[derive(Debug, Error)]
pub enum QueueError {
    // ===== Model Errors =====
    /// Invalid model parameters.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QueueError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}
