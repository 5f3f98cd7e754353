//! # Storefront Preview Merge
//!
//! Builds the "buy more, save more" breakpoint list shown on a product page.
//!
//! ## Merge Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  configs ──► live? (ACTIVE, inside window)                              │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │              eligible for this variant and buyer?                       │
//! │                 │                                                       │
//! │       ┌─────────┴──────────┐                                            │
//! │       ▼                    ▼                                            │
//! │   QUANTITY: all tiers   PRICE: this variant's tiers                     │
//! │       │                    │                                            │
//! │       └─────────┬──────────┘                                            │
//! │                 ▼                                                       │
//! │     flatten ──► stable sort by threshold ──► [PreviewEntry]             │
//! │                                                                         │
//! │  Example: QUANTITY [8, 2] + PRICE [4] ──► [2 Q, 4 P, 8 Q]               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use ts_rs::TS;

use crate::eligibility::check_variant_eligibility;
use crate::money::Money;
use crate::tier::select_tier_index;
use crate::types::{
    Adjustment, CustomerContext, DiscountConfiguration, DiscountKind, DiscountRules, VariantDetails,
};

// =============================================================================
// Preview DTOs
// =============================================================================

/// What a breakpoint gives the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreviewValue {
    /// Percent off each unit.
    Percentage {
        #[ts(type = "string")]
        value: Decimal,
    },
    /// Fixed amount off each unit, shop currency.
    FixedAmountPerUnit {
        #[ts(type = "string")]
        amount: Money,
    },
    /// Absolute unit price, shop currency.
    TargetUnitPrice {
        #[ts(type = "string")]
        price: Money,
    },
}

impl From<&Adjustment> for PreviewValue {
    fn from(adjustment: &Adjustment) -> Self {
        match adjustment {
            Adjustment::Percentage { value } => PreviewValue::Percentage { value: *value },
            Adjustment::FixedAmountPerUnit { amount, .. } => {
                PreviewValue::FixedAmountPerUnit { amount: *amount }
            }
        }
    }
}

/// One breakpoint in the storefront list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEntry {
    pub discount_id: String,
    pub kind: DiscountKind,
    pub title: String,
    pub threshold_quantity: u32,
    pub value: PreviewValue,
    /// The entry checkout would apply at the shopper's current quantity.
    pub selected: bool,
}

// =============================================================================
// Merge
// =============================================================================

/// Merges the tiers of every live, eligible configuration for one variant.
///
/// Entries are sorted ascending by threshold; equal thresholds keep the order
/// of `configs` and of each tier list. Returns an empty list when nothing
/// survives.
pub fn merge_preview(
    configs: &[DiscountConfiguration],
    variant: &VariantDetails,
    customer: &CustomerContext,
    now: DateTime<Utc>,
) -> Vec<PreviewEntry> {
    let mut entries = Vec::new();

    for config in configs {
        if !config.is_live(now) {
            debug!(discount_id = %config.id, status = ?config.status, "Preview skips inactive discount");
            continue;
        }

        let eligibility = check_variant_eligibility(config, variant, customer);
        if !eligibility.is_eligible() {
            debug!(discount_id = %config.id, ?eligibility, "Preview skips discount");
            continue;
        }

        let entry = |threshold_quantity, value| PreviewEntry {
            discount_id: config.id.clone(),
            kind: config.kind(),
            title: config.display_message().to_string(),
            threshold_quantity,
            value,
            selected: false,
        };

        match &config.rules {
            DiscountRules::Quantity { tiers, .. } => entries.extend(
                tiers
                    .iter()
                    .map(|tier| entry(tier.threshold_quantity, PreviewValue::from(&tier.adjustment))),
            ),
            DiscountRules::Price { .. } => {
                if let Some(tiers) = config.rules.price_tiers_for(&variant.variant_id) {
                    entries.extend(tiers.iter().map(|tier| {
                        entry(
                            tier.threshold_quantity,
                            PreviewValue::TargetUnitPrice {
                                price: tier.target_unit_price,
                            },
                        )
                    }));
                }
            }
        }
    }

    // Vec::sort_by_key is stable
    entries.sort_by_key(|entry| entry.threshold_quantity);
    entries
}

/// Flags the entry the tier selector picks at `quantity`.
///
/// Clears any previous flag. Returns the selected index.
pub fn mark_selected(entries: &mut [PreviewEntry], quantity: u32) -> Option<usize> {
    for entry in entries.iter_mut() {
        entry.selected = false;
    }

    let index = select_tier_index(entries, quantity)?;
    entries[index].selected = true;
    Some(index)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ActiveWindow, ApplyScope, CollectionMembership, CustomerEligibility, DiscountStatus,
        PriceTier, QuantityTier, VariantPriceTiers,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn quantity(id: &str, thresholds: &[u32]) -> DiscountConfiguration {
        DiscountConfiguration {
            id: id.to_string(),
            title: format!("Title {}", id),
            message: None,
            rules: DiscountRules::Quantity {
                apply_scope: ApplyScope::AllProducts,
                scope_targets: Default::default(),
                exclude_tags: Default::default(),
                tiers: thresholds
                    .iter()
                    .map(|&t| QuantityTier {
                        threshold_quantity: t,
                        adjustment: Adjustment::Percentage {
                            value: Decimal::from(t),
                        },
                    })
                    .collect(),
            },
            customer_eligibility: CustomerEligibility::Everyone,
            window: ActiveWindow {
                starts_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
                ends_at: None,
            },
            status: DiscountStatus::Active,
        }
    }

    fn price(id: &str, variant_id: &str, thresholds: &[u32]) -> DiscountConfiguration {
        let mut config = quantity(id, &[]);
        config.rules = DiscountRules::Price {
            variants: vec![VariantPriceTiers {
                variant_id: variant_id.to_string(),
                tiers: thresholds
                    .iter()
                    .map(|&t| PriceTier {
                        threshold_quantity: t,
                        target_unit_price: Money::from_minor(1000),
                    })
                    .collect(),
            }],
        };
        config
    }

    fn variant() -> VariantDetails {
        VariantDetails {
            variant_id: "v1".to_string(),
            product_id: Some("p1".to_string()),
            collections: CollectionMembership::Ids(Default::default()),
            ..Default::default()
        }
    }

    fn summary(entries: &[PreviewEntry]) -> Vec<(u32, DiscountKind)> {
        entries.iter().map(|e| (e.threshold_quantity, e.kind)).collect()
    }

    #[test]
    fn test_merge_sorts_across_kinds() {
        let configs = vec![quantity("q", &[8, 2]), price("p", "v1", &[4])];
        let entries = merge_preview(&configs, &variant(), &CustomerContext::anonymous(), now());

        assert_eq!(
            summary(&entries),
            vec![
                (2, DiscountKind::Quantity),
                (4, DiscountKind::Price),
                (8, DiscountKind::Quantity),
            ]
        );
        assert_eq!(entries[1].discount_id, "p");
        assert_eq!(
            entries[1].value,
            PreviewValue::TargetUnitPrice {
                price: Money::from_minor(1000)
            }
        );
    }

    #[test]
    fn test_merge_skips_inactive_and_out_of_window() {
        let mut expired = quantity("expired", &[2]);
        expired.status = DiscountStatus::Expired;

        let mut future = quantity("future", &[3]);
        future.window.starts_at = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();

        let mut ended = quantity("ended", &[4]);
        ended.window.ends_at = Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap());

        let configs = vec![expired, future, ended, quantity("live", &[5])];
        let entries = merge_preview(&configs, &variant(), &CustomerContext::anonymous(), now());

        assert_eq!(summary(&entries), vec![(5, DiscountKind::Quantity)]);
    }

    #[test]
    fn test_merge_skips_other_variants_price_tiers() {
        let configs = vec![price("p", "v2", &[4])];
        assert!(merge_preview(&configs, &variant(), &CustomerContext::anonymous(), now()).is_empty());
    }

    #[test]
    fn test_merge_applies_customer_gating() {
        let mut gated = quantity("vip", &[2]);
        gated.customer_eligibility = CustomerEligibility::CustomerList {
            emails: ["vip@example.com".to_string()].into_iter().collect(),
        };
        let configs = vec![gated];

        assert!(merge_preview(&configs, &variant(), &CustomerContext::anonymous(), now()).is_empty());
        assert_eq!(
            merge_preview(&configs, &variant(), &CustomerContext::with_email("vip@example.com"), now()).len(),
            1
        );
    }

    #[test]
    fn test_merge_equal_thresholds_keep_config_order() {
        let configs = vec![quantity("first", &[3]), quantity("second", &[3])];
        let entries = merge_preview(&configs, &variant(), &CustomerContext::anonymous(), now());
        let ids: Vec<_> = entries.iter().map(|e| e.discount_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_mark_selected() {
        let configs = vec![quantity("q", &[2, 4, 8])];
        let mut entries = merge_preview(&configs, &variant(), &CustomerContext::anonymous(), now());

        assert_eq!(mark_selected(&mut entries, 5), Some(1));
        assert!(entries[1].selected);
        assert_eq!(entries.iter().filter(|e| e.selected).count(), 1);

        assert_eq!(mark_selected(&mut entries, 1), None);
        assert!(entries.iter().all(|e| !e.selected));
    }

    #[test]
    fn test_entry_serialization() {
        let configs = vec![quantity("q", &[2])];
        let entries = merge_preview(&configs, &variant(), &CustomerContext::anonymous(), now());
        let json = serde_json::to_value(&entries[0]).unwrap();

        assert_eq!(json["discountId"], "q");
        assert_eq!(json["kind"], "QUANTITY");
        assert_eq!(json["thresholdQuantity"], 2);
        assert_eq!(json["value"]["type"], "PERCENTAGE");
        assert_eq!(json["value"]["value"], "2");
    }
}
