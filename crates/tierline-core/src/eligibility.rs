//! # Eligibility Evaluator
//!
//! Decides which cart lines a configuration discounts, and by how much.
//!
//! ## Filter Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Per-line filters (fixed order)                      │
//! │                                                                         │
//! │  CartLine                                                               │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  1. Merchandise is a product variant?      no ──► NotAVariant           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  2. Scope match (applyScope / allow-list)  no ──► OutOfScope            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  3. Excluded tag? (QUANTITY only)         yes ──► ExcludedByTag         │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  4. Customer eligible?                     no ──► CustomerNotEligible   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Eligible ──► Tier Selector ──► LineDiscount (or nothing)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first failing filter short-circuits. The checkout functions and the
//! storefront preview both call [`check_eligibility`], which keeps their
//! decisions identical for the same configuration.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::error::{CoreError, CoreResult};
use crate::money::PresentmentRate;
use crate::tier::select_tier;
use crate::types::{
    Adjustment, ApplyScope, CartLine, CustomerContext, DiscountConfiguration, DiscountRules,
    EvaluationResult, LineDiscount, VariantDetails,
};

// =============================================================================
// Eligibility
// =============================================================================

/// Outcome of the per-line filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Line holds something other than a product variant.
    NotAVariant,
    /// Line does not match the configuration's scope.
    OutOfScope,
    /// Product carries one of the configuration's excluded tags.
    ExcludedByTag,
    /// Buyer is not on the configuration's customer list.
    CustomerNotEligible,
}

impl Eligibility {
    /// Checks whether the line passed every filter.
    #[inline]
    pub fn is_eligible(self) -> bool {
        self == Eligibility::Eligible
    }
}

/// Runs the per-line filters for one line.
pub fn check_eligibility(
    config: &DiscountConfiguration,
    line: &CartLine,
    customer: &CustomerContext,
) -> Eligibility {
    let Some(variant) = line.variant() else {
        return Eligibility::NotAVariant;
    };
    check_variant_eligibility(config, variant, customer)
}

/// Runs filters 2 to 4 against a known product variant.
///
/// The storefront preview has no cart line, only the variant it displays.
pub fn check_variant_eligibility(
    config: &DiscountConfiguration,
    variant: &VariantDetails,
    customer: &CustomerContext,
) -> Eligibility {
    let in_scope = match &config.rules {
        DiscountRules::Quantity {
            apply_scope,
            scope_targets,
            ..
        } => matches_scope(*apply_scope, scope_targets, variant),
        DiscountRules::Price { .. } => config.rules.price_tiers_for(&variant.variant_id).is_some(),
    };
    if !in_scope {
        return Eligibility::OutOfScope;
    }

    if let DiscountRules::Quantity { exclude_tags, .. } = &config.rules {
        if !exclude_tags.is_disjoint(&variant.product_tags) {
            return Eligibility::ExcludedByTag;
        }
    }

    if !config.customer_eligibility.admits(customer) {
        return Eligibility::CustomerNotEligible;
    }

    Eligibility::Eligible
}

/// Scope match for QUANTITY discounts.
///
/// Empty targets mean "all products" for every scope except PRODUCT, which
/// needs explicit ids.
fn matches_scope(scope: ApplyScope, targets: &BTreeSet<String>, variant: &VariantDetails) -> bool {
    let contains = |value: &Option<String>| value.as_ref().is_some_and(|v| targets.contains(v));

    match scope {
        ApplyScope::AllProducts => true,
        ApplyScope::Product => {
            contains(&variant.product_id) || targets.contains(&variant.variant_id)
        }
        _ if targets.is_empty() => true,
        ApplyScope::Collection => variant.collections.matches(targets),
        ApplyScope::Tag => !variant.product_tags.is_disjoint(targets),
        ApplyScope::Vendor => contains(&variant.vendor),
        ApplyScope::Type => contains(&variant.product_type),
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Evaluates one configuration against a cart.
///
/// ## Arguments
/// * `config` - a validated, active configuration
/// * `lines` - cart lines in cart order
/// * `customer` - the buyer
/// * `rate` - shop currency to presentment currency multiplier
///
/// ## Returns
/// Discounted lines in cart order. Lines that fail a filter or reach no tier
/// are absent. Evaluation is pure: the same arguments always give the same
/// result.
///
/// ## Errors
/// [`CoreError::AmountOverflow`] when a converted amount or a PRICE
/// difference leaves the decimal range.
///
/// ## Adjustments
/// - QUANTITY percentage: emitted unchanged
/// - QUANTITY fixed amount: `amount × rate`
/// - PRICE: `unit_amount − target × rate`, clamped at zero (a clamped zero is
///   still emitted, since a tier was selected)
pub fn evaluate(
    config: &DiscountConfiguration,
    lines: &[CartLine],
    customer: &CustomerContext,
    rate: PresentmentRate,
) -> CoreResult<EvaluationResult> {
    let mut discounts = Vec::new();

    for line in lines {
        let eligibility = check_eligibility(config, line, customer);
        if !eligibility.is_eligible() {
            debug!(
                discount_id = %config.id,
                line_id = %line.line_id,
                ?eligibility,
                "Line skipped"
            );
            continue;
        }
        // Eligible implies a product variant
        let Some(variant) = line.variant() else {
            continue;
        };

        let overflow = || CoreError::AmountOverflow {
            discount_id: config.id.clone(),
            line_id: line.line_id.clone(),
        };

        let selected = match &config.rules {
            DiscountRules::Quantity { tiers, .. } => match select_tier(tiers, line.quantity) {
                Some(tier) => {
                    let adjustment = match &tier.adjustment {
                        Adjustment::Percentage { value } => Adjustment::Percentage { value: *value },
                        Adjustment::FixedAmountPerUnit { amount, .. } => {
                            Adjustment::FixedAmountPerUnit {
                                amount: amount.convert(rate).ok_or_else(overflow)?,
                                currency: None,
                            }
                        }
                    };
                    Some((tier.threshold_quantity, adjustment))
                }
                None => None,
            },
            DiscountRules::Price { .. } => match config
                .rules
                .price_tiers_for(&variant.variant_id)
                .and_then(|tiers| select_tier(tiers, line.quantity))
            {
                Some(tier) => {
                    let target = tier.target_unit_price.convert(rate).ok_or_else(overflow)?;
                    let amount = line.unit_amount.discount_to(target).ok_or_else(overflow)?;
                    Some((
                        tier.threshold_quantity,
                        Adjustment::FixedAmountPerUnit {
                            amount,
                            currency: None,
                        },
                    ))
                }
                None => None,
            },
        };

        let Some((threshold_quantity, adjustment)) = selected else {
            trace!(
                discount_id = %config.id,
                line_id = %line.line_id,
                quantity = line.quantity,
                "No tier reached"
            );
            continue;
        };

        debug!(
            discount_id = %config.id,
            line_id = %line.line_id,
            threshold_quantity,
            "Tier selected"
        );

        discounts.push(LineDiscount {
            line_id: line.line_id.clone(),
            variant_id: variant.variant_id.clone(),
            quantity: line.quantity,
            threshold_quantity,
            adjustment,
            applies_per_unit: true,
        });
    }

    Ok(EvaluationResult { discounts })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{
        CollectionMembership, CustomerEligibility, Merchandise, PriceTier, QuantityTier,
        VariantPriceTiers,
    };
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn percent(threshold: u32, value: i64) -> QuantityTier {
        QuantityTier {
            threshold_quantity: threshold,
            adjustment: Adjustment::Percentage {
                value: Decimal::new(value, 0),
            },
        }
    }

    fn quantity_config(scope: ApplyScope, targets: &[&str], exclude: &[&str]) -> DiscountConfiguration {
        DiscountConfiguration {
            id: "d-qty".to_string(),
            title: "Bulk".to_string(),
            message: None,
            rules: DiscountRules::Quantity {
                apply_scope: scope,
                scope_targets: set(targets),
                exclude_tags: set(exclude),
                tiers: vec![percent(2, 5), percent(4, 10), percent(8, 15)],
            },
            customer_eligibility: CustomerEligibility::Everyone,
            window: Default::default(),
            status: Default::default(),
        }
    }

    fn price_config(variant_id: &str, target: &str) -> DiscountConfiguration {
        DiscountConfiguration {
            id: "d-price".to_string(),
            title: "Case".to_string(),
            message: None,
            rules: DiscountRules::Price {
                variants: vec![VariantPriceTiers {
                    variant_id: variant_id.to_string(),
                    tiers: vec![PriceTier {
                        threshold_quantity: 2,
                        target_unit_price: Money::from_decimal(dec(target)),
                    }],
                }],
            },
            customer_eligibility: CustomerEligibility::Everyone,
            window: Default::default(),
            status: Default::default(),
        }
    }

    fn variant(id: &str) -> VariantDetails {
        VariantDetails {
            variant_id: id.to_string(),
            product_id: Some(format!("p-{}", id)),
            product_tags: set(&["summer"]),
            vendor: Some("Acme".to_string()),
            product_type: Some("Shirt".to_string()),
            collections: CollectionMembership::Ids(set(&["c1"])),
        }
    }

    fn line(id: &str, details: VariantDetails, quantity: u32, unit: &str) -> CartLine {
        CartLine {
            line_id: id.to_string(),
            quantity,
            unit_amount: Money::from_decimal(dec(unit)),
            merchandise: Merchandise::ProductVariant(details),
        }
    }

    #[test]
    fn test_non_variant_is_skipped() {
        let config = quantity_config(ApplyScope::AllProducts, &[], &[]);
        let gift_card = CartLine {
            line_id: "l1".to_string(),
            quantity: 10,
            unit_amount: Money::from_minor(5000),
            merchandise: Merchandise::Other {
                type_name: "CustomProduct".to_string(),
            },
        };
        assert_eq!(
            check_eligibility(&config, &gift_card, &CustomerContext::anonymous()),
            Eligibility::NotAVariant
        );
        assert!(evaluate(&config, &[gift_card], &CustomerContext::anonymous(), PresentmentRate::IDENTITY).unwrap().is_empty());
    }

    #[test]
    fn test_scope_matching() {
        let v = variant("v1");
        let anyone = CustomerContext::anonymous();
        let check = |config: DiscountConfiguration| check_variant_eligibility(&config, &v, &anyone);

        assert!(check(quantity_config(ApplyScope::AllProducts, &["ignored"], &[])).is_eligible());
        assert!(check(quantity_config(ApplyScope::Product, &["p-v1"], &[])).is_eligible());
        assert!(check(quantity_config(ApplyScope::Product, &["v1"], &[])).is_eligible());
        assert_eq!(check(quantity_config(ApplyScope::Product, &[], &[])), Eligibility::OutOfScope);
        assert!(check(quantity_config(ApplyScope::Collection, &["c1", "c9"], &[])).is_eligible());
        assert_eq!(check(quantity_config(ApplyScope::Collection, &["c9"], &[])), Eligibility::OutOfScope);
        assert!(check(quantity_config(ApplyScope::Tag, &["summer"], &[])).is_eligible());
        assert!(check(quantity_config(ApplyScope::Tag, &[], &[])).is_eligible());
        assert!(check(quantity_config(ApplyScope::Vendor, &["Acme"], &[])).is_eligible());
        assert_eq!(check(quantity_config(ApplyScope::Vendor, &["Other"], &[])), Eligibility::OutOfScope);
        assert!(check(quantity_config(ApplyScope::Type, &["Shirt"], &[])).is_eligible());
    }

    #[test]
    fn test_resolved_collection_membership() {
        let config = quantity_config(ApplyScope::Collection, &["c1"], &[]);
        let mut v = variant("v1");
        v.collections = CollectionMembership::Resolved(false);
        assert_eq!(
            check_variant_eligibility(&config, &v, &CustomerContext::anonymous()),
            Eligibility::OutOfScope
        );
        v.collections = CollectionMembership::Resolved(true);
        assert!(check_variant_eligibility(&config, &v, &CustomerContext::anonymous()).is_eligible());
    }

    #[test]
    fn test_exclusion_takes_precedence_over_scope() {
        let config = quantity_config(ApplyScope::Tag, &["summer"], &["summer"]);
        assert_eq!(
            check_variant_eligibility(&config, &variant("v1"), &CustomerContext::anonymous()),
            Eligibility::ExcludedByTag
        );
    }

    #[test]
    fn test_price_ignores_exclude_tags_and_checks_allow_list() {
        let config = price_config("v1", "8");
        assert!(check_variant_eligibility(&config, &variant("v1"), &CustomerContext::anonymous()).is_eligible());
        assert_eq!(
            check_variant_eligibility(&config, &variant("v2"), &CustomerContext::anonymous()),
            Eligibility::OutOfScope
        );
    }

    #[test]
    fn test_customer_gating() {
        let mut config = quantity_config(ApplyScope::AllProducts, &[], &[]);
        config.customer_eligibility = CustomerEligibility::CustomerList {
            emails: set(&["vip@example.com"]),
        };
        let lines = vec![line("l1", variant("v1"), 5, "20")];

        assert!(evaluate(&config, &lines, &CustomerContext::anonymous(), PresentmentRate::IDENTITY).unwrap().is_empty());
        assert!(evaluate(&config, &lines, &CustomerContext::with_email("x@example.com"), PresentmentRate::IDENTITY).unwrap().is_empty());
        assert_eq!(
            evaluate(&config, &lines, &CustomerContext::with_email("vip@example.com"), PresentmentRate::IDENTITY).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_quantity_percentage_tiers() {
        let config = quantity_config(ApplyScope::AllProducts, &[], &[]);
        let lines = vec![
            line("l1", variant("v1"), 5, "20"),
            line("l2", variant("v2"), 1, "20"),
            line("l3", variant("v3"), 10, "20"),
        ];

        let result = evaluate(&config, &lines, &CustomerContext::anonymous(), PresentmentRate::IDENTITY).unwrap();
        let summary: Vec<_> = result
            .iter()
            .map(|d| (d.line_id.as_str(), d.threshold_quantity, d.adjustment.clone()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("l1", 4, Adjustment::Percentage { value: Decimal::new(10, 0) }),
                ("l3", 8, Adjustment::Percentage { value: Decimal::new(15, 0) }),
            ]
        );
        assert!(result.iter().all(|d| d.applies_per_unit));
    }

    #[test]
    fn test_fixed_amount_is_converted_once() {
        let mut config = quantity_config(ApplyScope::AllProducts, &[], &[]);
        config.rules = DiscountRules::Quantity {
            apply_scope: ApplyScope::AllProducts,
            scope_targets: BTreeSet::new(),
            exclude_tags: BTreeSet::new(),
            tiers: vec![QuantityTier {
                threshold_quantity: 1,
                adjustment: Adjustment::FixedAmountPerUnit {
                    amount: Money::from_decimal(dec("10")),
                    currency: Some("USD".to_string()),
                },
            }],
        };
        let rate = PresentmentRate::new(dec("1.1")).unwrap();
        let result = evaluate(&config, &[line("l1", variant("v1"), 3, "40")], &CustomerContext::anonymous(), rate).unwrap();

        assert_eq!(
            result.discounts[0].adjustment,
            Adjustment::FixedAmountPerUnit {
                amount: Money::from_decimal(dec("11")),
                currency: None,
            }
        );
    }

    #[test]
    fn test_price_discount_is_difference_to_target() {
        let config = price_config("v1", "500");
        let result = evaluate(
            &config,
            &[line("l1", variant("v1"), 2, "550")],
            &CustomerContext::anonymous(),
            PresentmentRate::IDENTITY,
        )
        .unwrap();
        assert_eq!(
            result.discounts[0].adjustment,
            Adjustment::FixedAmountPerUnit {
                amount: Money::from_decimal(dec("50")),
                currency: None,
            }
        );
    }

    #[test]
    fn test_price_discount_clamps_to_zero() {
        let config = price_config("v1", "600");
        let result = evaluate(
            &config,
            &[line("l1", variant("v1"), 2, "550")],
            &CustomerContext::anonymous(),
            PresentmentRate::IDENTITY,
        )
        .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.discounts[0].adjustment,
            Adjustment::FixedAmountPerUnit {
                amount: Money::zero(),
                currency: None,
            }
        );
    }

    #[test]
    fn test_price_target_converted_before_subtracting() {
        let config = price_config("v1", "10");
        let rate = PresentmentRate::new(dec("1.5")).unwrap();
        let result = evaluate(&config, &[line("l1", variant("v1"), 2, "20")], &CustomerContext::anonymous(), rate).unwrap();
        // 20 − 10 × 1.5
        assert_eq!(
            result.discounts[0].adjustment,
            Adjustment::FixedAmountPerUnit {
                amount: Money::from_decimal(dec("5")),
                currency: None,
            }
        );
    }

    #[test]
    fn test_evaluate_is_idempotent_and_ordered() {
        let config = quantity_config(ApplyScope::AllProducts, &[], &[]);
        let lines = vec![
            line("l3", variant("v3"), 9, "20"),
            line("l1", variant("v1"), 2, "20"),
        ];
        let first = evaluate(&config, &lines, &CustomerContext::anonymous(), PresentmentRate::IDENTITY).unwrap();
        let second = evaluate(&config, &lines, &CustomerContext::anonymous(), PresentmentRate::IDENTITY).unwrap();

        assert_eq!(first, second);
        let ids: Vec<_> = first.iter().map(|d| d.line_id.as_str()).collect();
        assert_eq!(ids, vec!["l3", "l1"]);
    }

    #[test]
    fn test_overflowing_amounts_are_errors() {
        let mut config = quantity_config(ApplyScope::AllProducts, &[], &[]);
        config.rules = DiscountRules::Quantity {
            apply_scope: ApplyScope::AllProducts,
            scope_targets: BTreeSet::new(),
            exclude_tags: BTreeSet::new(),
            tiers: vec![QuantityTier {
                threshold_quantity: 1,
                adjustment: Adjustment::FixedAmountPerUnit {
                    amount: Money::from_decimal(Decimal::MAX),
                    currency: None,
                },
            }],
        };
        let rate = PresentmentRate::new(dec("2")).unwrap();
        let lines = [line("l1", variant("v1"), 1, "20")];
        assert!(matches!(
            evaluate(&config, &lines, &CustomerContext::anonymous(), rate),
            Err(CoreError::AmountOverflow { line_id, .. }) if line_id == "l1"
        ));

        // Cart price far below the target
        let config = price_config("v1", "1");
        let lines = [CartLine {
            unit_amount: Money::from_decimal(Decimal::MIN),
            ..line("l2", variant("v1"), 2, "0")
        }];
        assert!(matches!(
            evaluate(&config, &lines, &CustomerContext::anonymous(), PresentmentRate::IDENTITY),
            Err(CoreError::AmountOverflow { .. })
        ));
    }
}
