//! # Domain Types
//!
//! Core domain types used throughout Tierline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────────┐        ┌──────────────────────────┐      │
//! │  │  DiscountConfiguration   │        │        CartLine          │      │
//! │  │  ──────────────────────  │        │  ──────────────────────  │      │
//! │  │  id, title, message      │        │  line_id                 │      │
//! │  │  rules ──────────────┐   │        │  quantity                │      │
//! │  │  customer_eligibility│   │        │  unit_amount (Money)     │      │
//! │  │  window, status      │   │        │  merchandise ──┐         │      │
//! │  └──────────────────────┼───┘        └────────────────┼─────────┘      │
//! │                         ▼                             ▼                 │
//! │  ┌──────────────────────────┐        ┌──────────────────────────┐      │
//! │  │  DiscountRules           │        │  Merchandise             │      │
//! │  │  Quantity { scope,       │        │  ProductVariant(details) │      │
//! │  │    targets, exclusions,  │        │  Other { type_name }     │      │
//! │  │    tiers }               │        └──────────────────────────┘      │
//! │  │  Price { variants[] }    │                                          │
//! │  └──────────────────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialized Form
//! `DiscountConfiguration` is stored as JSON (discount metafield, database
//! column). Field names are camelCase, enum tags SCREAMING_SNAKE_CASE:
//! ```json
//! {
//!   "id": "gid://shopify/DiscountAutomaticNode/1",
//!   "title": "Buy more, save more",
//!   "rules": {
//!     "kind": "QUANTITY",
//!     "applyScope": "TAG",
//!     "scopeTargets": ["summer"],
//!     "excludeTags": ["final-sale"],
//!     "tiers": [
//!       { "thresholdQuantity": 2, "adjustment": { "type": "PERCENTAGE", "value": "5" } }
//!     ]
//!   },
//!   "customerEligibility": { "mode": "EVERYONE" },
//!   "window": { "startsAt": "2026-01-01T00:00:00Z", "endsAt": null }
//! }
//! ```

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation;

// =============================================================================
// Discount Kind
// =============================================================================

/// Which of the two checkout functions a configuration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// Tiered percentage or fixed amount off, scoped by product attributes.
    Quantity,
    /// Tiered absolute unit price, per explicitly listed variant.
    Price,
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountKind::Quantity => write!(f, "QUANTITY"),
            DiscountKind::Price => write!(f, "PRICE"),
        }
    }
}

impl std::str::FromStr for DiscountKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quantity" => Ok(DiscountKind::Quantity),
            "price" => Ok(DiscountKind::Price),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown discount kind: '{}'. Valid options: quantity, price",
                other
            ))),
        }
    }
}

// =============================================================================
// Discount Status
// =============================================================================

/// Lifecycle status, maintained by the external status scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountStatus {
    /// Live at checkout and on the storefront.
    #[default]
    Active,
    /// Window has not started yet.
    Scheduled,
    /// Window has ended.
    Expired,
    /// Saved by the merchant but never activated.
    Draft,
}

// =============================================================================
// Apply Scope
// =============================================================================

/// Which line attribute a QUANTITY discount matches against `scope_targets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyScope {
    /// Every product variant.
    #[default]
    AllProducts,
    /// Listed product ids or variant ids.
    Product,
    /// Membership in any listed collection.
    Collection,
    /// Any listed product tag.
    Tag,
    /// Listed vendor names.
    Vendor,
    /// Listed product types.
    Type,
}

// =============================================================================
// Adjustment
// =============================================================================

/// A per-unit price change.
///
/// Stored on QUANTITY tiers, and produced for both kinds in evaluation
/// results (PRICE discounts come out as `FixedAmountPerUnit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Adjustment {
    /// Percent off each unit (`10` = 10%).
    Percentage { value: Decimal },
    /// Fixed amount off each unit.
    FixedAmountPerUnit {
        amount: Money,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        currency: Option<String>,
    },
}

// =============================================================================
// Tiers
// =============================================================================

/// A QUANTITY tier: reach `threshold_quantity` units, get `adjustment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityTier {
    pub threshold_quantity: u32,
    pub adjustment: Adjustment,
}

/// A PRICE tier: reach `threshold_quantity` units, pay `target_unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub threshold_quantity: u32,
    /// Absolute unit price in the shop currency.
    pub target_unit_price: Money,
}

/// The tier list of one variant in a PRICE discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPriceTiers {
    pub variant_id: String,
    pub tiers: Vec<PriceTier>,
}

// =============================================================================
// Discount Rules
// =============================================================================

/// Kind-specific part of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountRules {
    #[serde(rename_all = "camelCase")]
    Quantity {
        #[serde(default)]
        apply_scope: ApplyScope,
        #[serde(default)]
        scope_targets: BTreeSet<String>,
        #[serde(default)]
        exclude_tags: BTreeSet<String>,
        tiers: Vec<QuantityTier>,
    },
    /// The variant allow-list is exactly the set of listed `variant_id`s.
    #[serde(rename_all = "camelCase")]
    Price { variants: Vec<VariantPriceTiers> },
}

impl DiscountRules {
    /// Returns the discriminator.
    pub fn kind(&self) -> DiscountKind {
        match self {
            DiscountRules::Quantity { .. } => DiscountKind::Quantity,
            DiscountRules::Price { .. } => DiscountKind::Price,
        }
    }

    /// Returns the tier list of `variant_id` in a PRICE discount.
    ///
    /// `None` for QUANTITY rules and for variants outside the allow-list.
    pub fn price_tiers_for(&self, variant_id: &str) -> Option<&[PriceTier]> {
        match self {
            DiscountRules::Price { variants } => variants
                .iter()
                .find(|v| v.variant_id == variant_id)
                .map(|v| v.tiers.as_slice()),
            DiscountRules::Quantity { .. } => None,
        }
    }
}

// =============================================================================
// Customer Eligibility
// =============================================================================

/// Who may receive the discount.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerEligibility {
    #[default]
    Everyone,
    /// Only buyers whose email is listed. Anonymous buyers never qualify.
    CustomerList {
        #[serde(default)]
        emails: BTreeSet<String>,
    },
}

impl CustomerEligibility {
    /// Checks whether a buyer with the given context qualifies.
    pub fn admits(&self, customer: &CustomerContext) -> bool {
        match self {
            CustomerEligibility::Everyone => true,
            CustomerEligibility::CustomerList { emails } => customer
                .email
                .as_deref()
                .is_some_and(|email| emails.contains(email)),
        }
    }
}

// =============================================================================
// Active Window
// =============================================================================

/// Scheduling window. `ends_at = None` means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWindow {
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl ActiveWindow {
    /// Checks `starts_at ≤ now ≤ ends_at` (both bounds inclusive).
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && self.ends_at.map_or(true, |end| now <= end)
    }
}

/// Open since the Unix epoch, never ending.
impl Default for ActiveWindow {
    fn default() -> Self {
        ActiveWindow {
            starts_at: DateTime::<Utc>::default(),
            ends_at: None,
        }
    }
}

// =============================================================================
// Discount Configuration
// =============================================================================

/// One merchant-configured discount, fully resolved.
///
/// Read-only inside the core: loaded whole for each evaluation call and never
/// mutated by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountConfiguration {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Checkout line message; falls back to `title`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub rules: DiscountRules,
    #[serde(default)]
    pub customer_eligibility: CustomerEligibility,
    #[serde(default)]
    pub window: ActiveWindow,
    #[serde(default)]
    pub status: DiscountStatus,
}

impl DiscountConfiguration {
    /// Parses and validates a serialized configuration.
    ///
    /// ## Returns
    /// * `Ok(config)` - well-typed and internally consistent
    /// * `Err(CoreError::ConfigurationParse)` - not JSON, unknown enum, missing field
    /// * `Err(CoreError::InvalidConfiguration)` - parsed but breaks a rule
    ///
    /// ## Example
    /// ```rust
    /// use tierline_core::DiscountConfiguration;
    ///
    /// let json = r#"{
    ///     "id": "d1",
    ///     "rules": {
    ///         "kind": "QUANTITY",
    ///         "tiers": [{ "thresholdQuantity": 3, "adjustment": { "type": "PERCENTAGE", "value": "10" } }]
    ///     }
    /// }"#;
    /// let config = DiscountConfiguration::from_json(json).unwrap();
    /// assert_eq!(config.kind(), tierline_core::DiscountKind::Quantity);
    ///
    /// assert!(DiscountConfiguration::from_json(r#"{"id":"d2","rules":{"kind":"BOGO"}}"#).is_err());
    /// ```
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: DiscountConfiguration = serde_json::from_str(json)?;
        validation::validate_configuration(&config).map_err(|source| {
            CoreError::InvalidConfiguration {
                discount_id: config.id.clone(),
                source,
            }
        })?;
        Ok(config)
    }

    /// Returns the discriminator.
    #[inline]
    pub fn kind(&self) -> DiscountKind {
        self.rules.kind()
    }

    /// Message shown on the discounted checkout line.
    pub fn display_message(&self) -> &str {
        match self.message.as_deref() {
            Some(message) if !message.trim().is_empty() => message,
            _ => &self.title,
        }
    }

    /// Checks whether the storefront should consider this discount live.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == DiscountStatus::Active && self.window.contains(now)
    }
}

// =============================================================================
// Cart Input
// =============================================================================

/// Who is buying. Only the email takes part in eligibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerContext {
    pub email: Option<String>,
}

impl CustomerContext {
    /// A buyer that is not logged in.
    pub fn anonymous() -> Self {
        CustomerContext { email: None }
    }

    /// A buyer identified by email.
    pub fn with_email(email: impl Into<String>) -> Self {
        CustomerContext {
            email: Some(email.into()),
        }
    }
}

/// How a line's collection membership is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionMembership {
    /// Already answered by the checkout runtime (`inAnyCollection`, queried
    /// with the configuration's collection ids).
    Resolved(bool),
    /// Raw collection ids (storefront form input), to intersect with targets.
    Ids(BTreeSet<String>),
}

impl CollectionMembership {
    /// Checks membership in any of `targets`.
    pub fn matches(&self, targets: &BTreeSet<String>) -> bool {
        match self {
            CollectionMembership::Resolved(member) => *member,
            CollectionMembership::Ids(ids) => !ids.is_disjoint(targets),
        }
    }
}

impl Default for CollectionMembership {
    fn default() -> Self {
        CollectionMembership::Resolved(false)
    }
}

/// Product variant attributes a discount can scope on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantDetails {
    pub variant_id: String,
    pub product_id: Option<String>,
    pub product_tags: BTreeSet<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub collections: CollectionMembership,
}

/// What a cart line holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merchandise {
    ProductVariant(VariantDetails),
    /// Anything else (custom products, gift cards, ...). Never discounted.
    Other { type_name: String },
}

/// One cart line, supplied per call and never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub line_id: String,
    pub quantity: u32,
    /// Unit price in the presentment currency.
    pub unit_amount: Money,
    pub merchandise: Merchandise,
}

impl CartLine {
    /// Returns the variant details, if the line holds a product variant.
    pub fn variant(&self) -> Option<&VariantDetails> {
        match &self.merchandise {
            Merchandise::ProductVariant(details) => Some(details),
            Merchandise::Other { .. } => None,
        }
    }
}

// =============================================================================
// Evaluation Output
// =============================================================================

/// The discount granted to one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDiscount {
    pub line_id: String,
    pub variant_id: String,
    pub quantity: u32,
    /// Threshold of the tier that was selected.
    pub threshold_quantity: u32,
    pub adjustment: Adjustment,
    pub applies_per_unit: bool,
}

/// Ordered per-line discounts for one configuration.
///
/// Empty means "no discount applies". Lines without a discount are absent,
/// never represented as zero entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EvaluationResult {
    pub discounts: Vec<LineDiscount>,
}

impl EvaluationResult {
    /// Checks whether nothing applies.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.discounts.is_empty()
    }

    /// Number of discounted lines.
    #[inline]
    pub fn len(&self) -> usize {
        self.discounts.len()
    }

    /// Iterates the discounted lines in cart order.
    pub fn iter(&self) -> impl Iterator<Item = &LineDiscount> {
        self.discounts.iter()
    }
}

// =============================================================================
// Storefront Settings
// =============================================================================

/// How the storefront block lays out breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DisplayLayout {
    #[default]
    Table,
    List,
}

/// Per-shop display settings echoed to the storefront block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StorefrontSettings {
    #[serde(default = "default_heading")]
    pub heading: String,
    #[serde(default)]
    pub layout: DisplayLayout,
    #[serde(default = "default_true")]
    pub show_savings: bool,
}

fn default_heading() -> String {
    "Buy more, save more".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        StorefrontSettings {
            heading: default_heading(),
            layout: DisplayLayout::default(),
            show_savings: default_true(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
