//! # Money Module
//!
//! Provides the `Money` type for monetary values and the `PresentmentRate`
//! used to move stored discount amounts into the buyer's checkout currency.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    10.00 × 1.1 = 11.000000000000002  ❌ WRONG!                          │
//! │                                                                         │
//! │  Checkout amounts arrive as decimal strings ("24.99") and presentment  │
//! │  rates are fractional (1.1, 0.7342). Integer cents cannot hold a       │
//! │  converted amount before rounding, floats cannot hold it exactly.      │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    10.00 × 1.1 = 11.000                                                 │
//! │    Exact base-10 arithmetic, no rounding until display                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use tierline_core::money::{Money, PresentmentRate};
//!
//! let amount = Money::from_minor(1000); // 10.00 in the shop currency
//! let rate = PresentmentRate::new(Decimal::new(11, 1)).unwrap(); // 1.1
//!
//! assert_eq!(amount.convert(rate), Some(Money::from_minor(1100)));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in major units (e.g. `24.99`).
///
/// ## Design Decisions
/// - **Decimal (signed)**: subtraction may go negative before clamping
/// - **Single field tuple struct**: zero-cost over `Decimal`
/// - **Transparent serde**: serializes exactly like the wrapped decimal, so
///   `"24.99"` in a checkout document maps straight onto `Money`
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CartLine.unit_amount ──────────────┐                                   │
/// │                                     ├──► PRICE: unit − target × rate    │
/// │  PriceTier.target_unit_price ──────┘                                   │
/// │                                                                         │
/// │  Adjustment::FixedAmountPerUnit ───────► QUANTITY: amount × rate        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates Money from a decimal amount in major units.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates Money from minor units (cents for two-decimal currencies).
    ///
    /// ## Example
    /// ```rust
    /// use tierline_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_minor(minor: i64) -> Self {
        Money(Decimal::new(minor, 2))
    }

    /// Returns the wrapped decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Converts a shop-currency amount into the presentment currency.
    ///
    /// The conversion is a single multiplication. Callers apply it once per
    /// line; converting an already converted amount would compound the rate.
    ///
    /// ## Returns
    /// `None` when the product does not fit in a `Decimal`.
    #[inline]
    pub fn convert(self, rate: PresentmentRate) -> Option<Money> {
        self.0.checked_mul(rate.value()).map(Money)
    }

    /// Returns `self − target`, clamped at zero.
    ///
    /// ## Example
    /// ```rust
    /// use tierline_core::money::Money;
    ///
    /// let cart_price = Money::from_minor(55000);
    /// assert_eq!(cart_price.discount_to(Money::from_minor(50000)), Some(Money::from_minor(5000)));
    /// // Target above the cart price never yields a negative discount
    /// assert_eq!(cart_price.discount_to(Money::from_minor(60000)), Some(Money::zero()));
    /// ```
    ///
    /// ## Returns
    /// `None` when the difference does not fit in a `Decimal`.
    pub fn discount_to(self, target: Money) -> Option<Money> {
        let difference = Money(self.0.checked_sub(target.0)?);
        if difference.is_negative() {
            Some(Money::zero())
        } else {
            Some(difference)
        }
    }

    /// Returns the amount with trailing zeros removed (`11.000` → `11`).
    #[inline]
    pub fn normalized(self) -> Money {
        Money(self.0.normalize())
    }
}

/// Display shows the plain decimal amount (`10.99`).
///
/// ## Note
/// No currency symbol: the core never knows which currency the storefront
/// renders in. Theme code formats for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Presentment Rate
// =============================================================================

/// Multiplier from the shop's currency to the buyer's presentment currency.
///
/// Always strictly positive; construct through [`PresentmentRate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PresentmentRate(Decimal);

impl PresentmentRate {
    /// Identity rate, for checkouts presented in the shop currency.
    pub const IDENTITY: PresentmentRate = PresentmentRate(Decimal::ONE);

    /// Creates a rate, rejecting zero and negative values.
    pub fn new(rate: Decimal) -> Result<Self, ValidationError> {
        if rate <= Decimal::ZERO {
            return Err(ValidationError::MustBePositive {
                field: "presentmentCurrencyRate".to_string(),
            });
        }
        Ok(PresentmentRate(rate))
    }

    /// Returns the rate as a decimal.
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
