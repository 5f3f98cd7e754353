//! # Tier Selector
//!
//! Picks the tier that applies at a given quantity.
//!
//! ## Selection Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tiers:     [2: 5%]   [4: 10%]   [8: 15%]                               │
//! │                                                                         │
//! │  quantity 1  ──► none      (no threshold ≤ 1)                           │
//! │  quantity 5  ──► [4: 10%]  (greatest threshold ≤ 5)                     │
//! │  quantity 10 ──► [8: 15%]                                               │
//! │                                                                         │
//! │  Equal thresholds: the LATER declared tier wins                         │
//! │  tiers [3: 5%] [3: 7%] at quantity 3 ──► [3: 7%]                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same selector runs at checkout (quantity and price tiers) and on the
//! storefront (merged preview entries), so both surfaces always agree on
//! which tier a quantity earns.

use crate::preview::PreviewEntry;
use crate::types::{PriceTier, QuantityTier};

/// Anything carrying a minimum quantity.
pub trait Threshold {
    /// Minimum line quantity at which this tier applies.
    fn threshold(&self) -> u32;
}

impl Threshold for QuantityTier {
    #[inline]
    fn threshold(&self) -> u32 {
        self.threshold_quantity
    }
}

impl Threshold for PriceTier {
    #[inline]
    fn threshold(&self) -> u32 {
        self.threshold_quantity
    }
}

impl Threshold for PreviewEntry {
    #[inline]
    fn threshold(&self) -> u32 {
        self.threshold_quantity
    }
}

/// Returns the index of the tier that applies at `quantity`.
///
/// Scans every tier; a tier replaces the current best when its threshold is
/// positive, at most `quantity`, and at least the current best threshold.
/// Tiers need not be sorted.
pub fn select_tier_index<T: Threshold>(tiers: &[T], quantity: u32) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;

    for (index, tier) in tiers.iter().enumerate() {
        let threshold = tier.threshold();
        if threshold == 0 || threshold > quantity {
            continue;
        }
        match best {
            Some((_, current)) if threshold < current => {}
            _ => best = Some((index, threshold)),
        }
    }

    best.map(|(index, _)| index)
}

/// Returns the tier that applies at `quantity`, if any.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use tierline_core::tier::select_tier;
/// use tierline_core::types::{Adjustment, QuantityTier};
///
/// let tier = |threshold, pct| QuantityTier {
///     threshold_quantity: threshold,
///     adjustment: Adjustment::Percentage { value: Decimal::new(pct, 0) },
/// };
/// let tiers = vec![tier(2, 5), tier(4, 10), tier(8, 15)];
///
/// assert_eq!(select_tier(&tiers, 5).map(|t| t.threshold_quantity), Some(4));
/// assert!(select_tier(&tiers, 1).is_none());
/// ```
pub fn select_tier<T: Threshold>(tiers: &[T], quantity: u32) -> Option<&T> {
    select_tier_index(tiers, quantity).map(|index| &tiers[index])
}

// =============================================================================
// Unit Tests
// =============================================================================
