//! # Error Types
//!
//! Domain-specific error types for tierline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tierline-core errors (this file)                                      │
//! │  ├── CoreError        - Configuration and input failures               │
//! │  └── ValidationError  - Field-level rule violations                    │
//! │                                                                         │
//! │  tierline-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  storefront-proxy errors (in app)                                      │
//! │  └── ProxyError       - What the storefront sees (JSON envelope)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ProxyError → Storefront │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## "No Discount" Is Not An Error
//! An empty evaluation result is the normal outcome for most carts. Nothing in
//! this file represents it. Every variant here means the caller must stop,
//! because an empty result would be indistinguishable from a real
//! "nothing applies" answer.

use thiserror::Error;

use crate::types::DiscountKind;

// =============================================================================
// Core Error
// =============================================================================

/// Core discount engine errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The serialized configuration could not be parsed.
    ///
    /// ## When This Occurs
    /// - Metafield value is not valid JSON
    /// - Unknown `kind`, `applyScope` or adjustment `type`
    /// - Required fields are missing
    #[error("Configuration could not be parsed: {0}")]
    ConfigurationParse(String),

    /// The configuration parsed but violates a business rule.
    #[error("Invalid configuration {discount_id}: {source}")]
    InvalidConfiguration {
        discount_id: String,
        #[source]
        source: ValidationError,
    },

    /// A configuration of one kind was handed to the other kind's function.
    #[error("Configuration {discount_id} is a {actual} discount, expected {expected}")]
    KindMismatch {
        discount_id: String,
        expected: DiscountKind,
        actual: DiscountKind,
    },

    /// The checkout input carried no discount configuration at all.
    #[error("Discount node has no configuration metafield")]
    MissingConfiguration,

    /// The checkout input carried no presentment currency rate.
    ///
    /// Never defaulted to 1.0: a silent default would misprice every
    /// fixed-amount and target-price tier in a foreign currency checkout.
    #[error("Presentment currency rate is missing")]
    MissingCurrencyRate,

    /// A converted amount or price difference does not fit in a decimal.
    ///
    /// Raised instead of a panic so the function fails like any other bad
    /// configuration.
    #[error("Amount overflow evaluating {discount_id} on line {line_id}")]
    AmountOverflow { discount_id: String, line_id: String },

    /// Cart or request input is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::ConfigurationParse(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level validation errors.
///
/// These are produced while checking a freshly parsed configuration, before
/// any evaluator code sees it.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must have at most {max} entries")]
    TooMany { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid id, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same variant listed twice).
    #[error("{field} '{value}' is listed more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
