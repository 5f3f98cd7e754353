//! # Validation Module
//!
//! Business rule checks for freshly parsed discount configurations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Known `kind`, `applyScope`, adjustment `type`                     │
//! │  └── Required fields present, numbers are numbers                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Tier lists non-empty and bounded                                  │
//! │  ├── Thresholds ≥ 1, percentages within 0..=100                        │
//! │  ├── Amounts and target prices not negative                            │
//! │  └── PRICE variants unique, window ordered                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Evaluator: may assume every configuration it sees is well formed      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tierline_core::validation::validate_threshold;
//!
//! assert!(validate_threshold(2).is_ok());
//! assert!(validate_threshold(0).is_err());
//! ```

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Adjustment, DiscountConfiguration, DiscountRules, PriceTier, QuantityTier};
use crate::MAX_TIERS_PER_LIST;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Configuration
// =============================================================================

/// Validates a whole configuration.
///
/// Called by [`DiscountConfiguration::from_json`]; exposed for records built
/// in code (seed data, tests).
pub fn validate_configuration(config: &DiscountConfiguration) -> ValidationResult<()> {
    if config.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    match &config.rules {
        DiscountRules::Quantity { tiers, .. } => validate_quantity_tiers(tiers)?,
        DiscountRules::Price { variants } => {
            if variants.is_empty() {
                return Err(ValidationError::Required {
                    field: "variants".to_string(),
                });
            }

            let mut seen = HashSet::new();
            for variant in variants {
                if variant.variant_id.trim().is_empty() {
                    return Err(ValidationError::Required {
                        field: "variantId".to_string(),
                    });
                }
                if !seen.insert(variant.variant_id.as_str()) {
                    return Err(ValidationError::Duplicate {
                        field: "variantId".to_string(),
                        value: variant.variant_id.clone(),
                    });
                }
                validate_price_tiers(&variant.tiers)?;
            }
        }
    }

    if let Some(ends_at) = config.window.ends_at {
        if ends_at < config.window.starts_at {
            return Err(ValidationError::InvalidFormat {
                field: "window".to_string(),
                reason: "endsAt is before startsAt".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Tier Lists
// =============================================================================

/// Validates the global tier list of a QUANTITY discount.
///
/// Equal thresholds are allowed; the tier selector resolves them
/// (later-declared wins).
pub fn validate_quantity_tiers(tiers: &[QuantityTier]) -> ValidationResult<()> {
    validate_list_length(tiers.len())?;

    for tier in tiers {
        validate_threshold(tier.threshold_quantity)?;
        validate_adjustment(&tier.adjustment)?;
    }

    Ok(())
}

/// Validates one variant's tier list in a PRICE discount.
pub fn validate_price_tiers(tiers: &[PriceTier]) -> ValidationResult<()> {
    validate_list_length(tiers.len())?;

    for tier in tiers {
        validate_threshold(tier.threshold_quantity)?;
        validate_non_negative("targetUnitPrice", tier.target_unit_price)?;
    }

    Ok(())
}

fn validate_list_length(len: usize) -> ValidationResult<()> {
    if len == 0 {
        return Err(ValidationError::Required {
            field: "tiers".to_string(),
        });
    }

    if len > MAX_TIERS_PER_LIST {
        return Err(ValidationError::TooMany {
            field: "tiers".to_string(),
            max: MAX_TIERS_PER_LIST,
        });
    }

    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a tier threshold.
///
/// ## Rules
/// - Must be at least 1 (a zero threshold would apply to an empty cart line)
pub fn validate_threshold(threshold: u32) -> ValidationResult<()> {
    if threshold == 0 {
        return Err(ValidationError::MustBePositive {
            field: "thresholdQuantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a QUANTITY adjustment.
///
/// ## Rules
/// - Percentage: 0 to 100 inclusive
/// - Fixed amount: not negative, currency (when present) a 3-letter code
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use tierline_core::types::Adjustment;
/// use tierline_core::validation::validate_adjustment;
///
/// assert!(validate_adjustment(&Adjustment::Percentage { value: Decimal::new(15, 0) }).is_ok());
/// assert!(validate_adjustment(&Adjustment::Percentage { value: Decimal::new(150, 0) }).is_err());
/// ```
pub fn validate_adjustment(adjustment: &Adjustment) -> ValidationResult<()> {
    match adjustment {
        Adjustment::Percentage { value } => {
            if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
                return Err(ValidationError::OutOfRange {
                    field: "percentage".to_string(),
                    min: "0".to_string(),
                    max: "100".to_string(),
                });
            }
        }
        Adjustment::FixedAmountPerUnit { amount, currency } => {
            validate_non_negative("amount", *amount)?;
            if let Some(code) = currency {
                if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
                    return Err(ValidationError::InvalidFormat {
                        field: "currency".to_string(),
                        reason: "must be a 3-letter ISO 4217 code".to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: "unbounded".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
