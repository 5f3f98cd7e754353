//! # tierline-core: Pure Discount Logic for Tierline
//!
//! This crate is the **heart** of Tierline. It decides which cart lines a
//! volume discount applies to and what each line gets, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tierline Architecture                            │
//! │                                                                         │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │   Checkout runtime           │   │   Storefront (theme block)   │   │
//! │  │   stdin JSON ─► stdout JSON  │   │   app proxy form post        │   │
//! │  └──────────────┬───────────────┘   └──────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼───────────────┐   ┌──────────────▼───────────────┐   │
//! │  │   checkout-function          │   │   storefront-proxy (axum)    │   │
//! │  └──────────────┬───────────────┘   └──────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────────────────────▼───────────────┐   │
//! │  │               ★ tierline-core (THIS CRATE) ★                     │   │
//! │  │                                                                  │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌─────────────┐  ┌──────────────┐ │   │
//! │  │   │  types   │  │   tier   │  │ eligibility │  │   preview    │ │   │
//! │  │   │  config  │  │ selector │  │  evaluate   │  │    merge     │ │   │
//! │  │   └──────────┘  └──────────┘  └─────────────┘  └──────────────┘ │   │
//! │  │                                                                  │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                   │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! │                                                 │                       │
//! │                                  ┌──────────────▼───────────────┐       │
//! │                                  │  tierline-db (SQLite store)  │       │
//! │                                  └──────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Discount configuration, cart lines, evaluation results
//! - [`money`] - Decimal money and presentment currency rates
//! - [`error`] - Domain error types
//! - [`validation`] - Configuration rules, checked at parse time
//! - [`tier`] - Tier selector shared by every call site
//! - [`eligibility`] - Per-line filters and the evaluator
//! - [`preview`] - Storefront breakpoint merge
//! - [`checkout`] - Checkout function input/output documents
//!
//! ## Example Usage
//!
//! ```rust
//! use tierline_core::{evaluate, CartLine, CustomerContext, DiscountConfiguration};
//! use tierline_core::money::{Money, PresentmentRate};
//! use tierline_core::types::{Merchandise, VariantDetails};
//!
//! let config = DiscountConfiguration::from_json(r#"{
//!     "id": "d1",
//!     "title": "Buy more, save more",
//!     "rules": {
//!         "kind": "QUANTITY",
//!         "tiers": [
//!             { "thresholdQuantity": 2, "adjustment": { "type": "PERCENTAGE", "value": "5" } },
//!             { "thresholdQuantity": 4, "adjustment": { "type": "PERCENTAGE", "value": "10" } }
//!         ]
//!     }
//! }"#).unwrap();
//!
//! let line = CartLine {
//!     line_id: "line-1".to_string(),
//!     quantity: 5,
//!     unit_amount: Money::from_minor(2000),
//!     merchandise: Merchandise::ProductVariant(VariantDetails {
//!         variant_id: "variant-1".to_string(),
//!         ..Default::default()
//!     }),
//! };
//!
//! let result = evaluate(&config, &[line], &CustomerContext::anonymous(), PresentmentRate::IDENTITY).unwrap();
//! assert_eq!(result.discounts[0].threshold_quantity, 4);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod eligibility;
pub mod error;
pub mod money;
pub mod preview;
pub mod tier;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{run_function, FunctionInput, FunctionResult};
pub use eligibility::{check_eligibility, evaluate, Eligibility};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, PresentmentRate};
pub use preview::{mark_selected, merge_preview, PreviewEntry, PreviewValue};
pub use tier::{select_tier, Threshold};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum tiers in one tier list (the QUANTITY list, or one PRICE variant's).
///
/// ## Business Reason
/// Keeps the storefront table readable and the checkout input query small.
pub const MAX_TIERS_PER_LIST: usize = 25;
