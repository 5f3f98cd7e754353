//! # Checkout Function Documents
//!
//! Input and output documents exchanged with the checkout runtime, and the
//! entry point both checkout functions run.
//!
//! ## Document Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout runtime                                                       │
//! │     │  FunctionInput (JSON)                                             │
//! │     │  ├── cart.lines[]            ──► CartLine                         │
//! │     │  ├── cart.buyerIdentity      ──► CustomerContext                  │
//! │     │  ├── presentmentCurrencyRate ──► PresentmentRate (required)       │
//! │     │  └── discountNode.metafield  ──► DiscountConfiguration (parsed    │
//! │     │                                  and validated on every call)     │
//! │     ▼                                                                   │
//! │  run_function(target, input)                                            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  FunctionResult (JSON)                                                  │
//! │     { discounts: [...], discountApplicationStrategy: "ALL" }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::eligibility::evaluate;
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, PresentmentRate};
use crate::types::{
    Adjustment, CartLine, CollectionMembership, CustomerContext, DiscountConfiguration,
    DiscountKind, Merchandise, VariantDetails,
};

/// `__typename` of variant merchandise.
const PRODUCT_VARIANT_TYPENAME: &str = "ProductVariant";

// =============================================================================
// Input Document
// =============================================================================

/// The checkout runtime's input document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInput {
    pub cart: CartInput,
    #[serde(default)]
    pub presentment_currency_rate: Option<Decimal>,
    pub discount_node: DiscountNodeInput,
}

impl FunctionInput {
    /// Parses an input document.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidInput(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInput {
    #[serde(default)]
    pub lines: Vec<CartLineInput>,
    #[serde(default)]
    pub buyer_identity: Option<BuyerIdentityInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuyerIdentityInput {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub id: String,
    pub quantity: u32,
    pub cost: CostInput,
    pub merchandise: MerchandiseInput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostInput {
    pub amount_per_quantity: MoneyInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoneyInput {
    pub amount: Money,
}

/// Merchandise as queried: variants carry `id` and `product`, everything
/// else only its `__typename`.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseInput {
    #[serde(rename = "__typename")]
    pub typename: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub product: Option<ProductInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    /// Answers for the tags the input query asked about.
    #[serde(default)]
    pub has_tags: Vec<HasTagInput>,
    #[serde(default)]
    pub in_any_collection: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasTagInput {
    pub tag: String,
    pub has_tag: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountNodeInput {
    #[serde(default)]
    pub metafield: Option<MetafieldInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetafieldInput {
    pub value: String,
}

impl From<&CartLineInput> for CartLine {
    fn from(input: &CartLineInput) -> Self {
        let merchandise = match (&input.merchandise.id, &input.merchandise.product) {
            (Some(id), Some(product)) if input.merchandise.typename == PRODUCT_VARIANT_TYPENAME => {
                Merchandise::ProductVariant(VariantDetails {
                    variant_id: id.clone(),
                    product_id: product.id.clone(),
                    product_tags: product
                        .has_tags
                        .iter()
                        .filter(|t| t.has_tag)
                        .map(|t| t.tag.clone())
                        .collect::<BTreeSet<_>>(),
                    vendor: product.vendor.clone(),
                    product_type: product.product_type.clone(),
                    collections: CollectionMembership::Resolved(product.in_any_collection),
                })
            }
            _ => Merchandise::Other {
                type_name: input.merchandise.typename.clone(),
            },
        };

        CartLine {
            line_id: input.id.clone(),
            quantity: input.quantity,
            unit_amount: input.cost.amount_per_quantity.amount,
            merchandise,
        }
    }
}

// =============================================================================
// Output Document
// =============================================================================

/// The document returned to the checkout runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResult {
    pub discounts: Vec<ProductDiscount>,
    pub discount_application_strategy: ApplicationStrategy,
}

impl FunctionResult {
    /// A result that discounts nothing.
    pub fn empty() -> Self {
        FunctionResult {
            discounts: Vec::new(),
            discount_application_strategy: ApplicationStrategy::All,
        }
    }
}

/// How the runtime combines the returned discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStrategy {
    /// Apply every returned discount.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDiscount {
    pub targets: Vec<DiscountTarget>,
    pub value: DiscountValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscountTarget {
    ProductVariant { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscountValue {
    Percentage {
        value: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    FixedAmount {
        amount: Money,
        applies_to_each_item: bool,
    },
}

impl From<&Adjustment> for DiscountValue {
    fn from(adjustment: &Adjustment) -> Self {
        match adjustment {
            Adjustment::Percentage { value } => DiscountValue::Percentage { value: *value },
            Adjustment::FixedAmountPerUnit { amount, .. } => DiscountValue::FixedAmount {
                amount: amount.normalized(),
                applies_to_each_item: true,
            },
        }
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Runs one checkout function over an input document.
///
/// ## Arguments
/// * `target` - which function is running (`QUANTITY` or `PRICE`)
/// * `input` - the runtime's input document
///
/// ## Errors
/// * `MissingConfiguration` - the discount node has no metafield
/// * `ConfigurationParse` / `InvalidConfiguration` - the metafield is unusable
/// * `KindMismatch` - the configuration belongs to the other function
/// * `MissingCurrencyRate` / `Validation` - rate absent or not positive
///
/// An empty `discounts` list is a normal result, not an error.
pub fn run_function(target: DiscountKind, input: &FunctionInput) -> CoreResult<FunctionResult> {
    let metafield = input
        .discount_node
        .metafield
        .as_ref()
        .ok_or(CoreError::MissingConfiguration)?;

    let config = DiscountConfiguration::from_json(&metafield.value)?;
    let actual = config.kind();
    if actual != target {
        return Err(CoreError::KindMismatch {
            discount_id: config.id,
            expected: target,
            actual,
        });
    }

    let rate = input
        .presentment_currency_rate
        .ok_or(CoreError::MissingCurrencyRate)?;
    let rate = PresentmentRate::new(rate)?;

    let customer = CustomerContext {
        email: input
            .cart
            .buyer_identity
            .as_ref()
            .and_then(|buyer| buyer.email.clone()),
    };
    let lines: Vec<CartLine> = input.cart.lines.iter().map(CartLine::from).collect();

    debug!(
        discount_id = %config.id,
        lines = lines.len(),
        rate = %rate.value(),
        "Evaluating checkout function"
    );

    let evaluation = evaluate(&config, &lines, &customer, rate)?;
    let message = config.display_message().to_string();

    let discounts: Vec<ProductDiscount> = evaluation
        .iter()
        .map(|line| ProductDiscount {
            targets: vec![DiscountTarget::ProductVariant {
                id: line.variant_id.clone(),
            }],
            value: DiscountValue::from(&line.adjustment),
            message: Some(message.clone()),
        })
        .collect();

    info!(
        discount_id = %config.id,
        kind = %target,
        discounted_lines = discounts.len(),
        "Checkout function finished"
    );

    Ok(FunctionResult {
        discounts,
        discount_application_strategy: ApplicationStrategy::All,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quantity_config() -> serde_json::Value {
        json!({
            "id": "gid://shopify/DiscountAutomaticNode/1",
            "title": "Bulk savings",
            "message": "Volume discount",
            "rules": {
                "kind": "QUANTITY",
                "applyScope": "TAG",
                "scopeTargets": ["bulk"],
                "excludeTags": ["final-sale"],
                "tiers": [
                    { "thresholdQuantity": 2, "adjustment": { "type": "PERCENTAGE", "value": "5" } },
                    { "thresholdQuantity": 4, "adjustment": { "type": "PERCENTAGE", "value": "10" } },
                    { "thresholdQuantity": 8, "adjustment": { "type": "FIXED_AMOUNT_PER_UNIT", "amount": "10.00" } }
                ]
            }
        })
    }

    fn price_config() -> serde_json::Value {
        json!({
            "id": "gid://shopify/DiscountAutomaticNode/2",
            "title": "Case pricing",
            "rules": {
                "kind": "PRICE",
                "variants": [
                    { "variantId": "gid://shopify/ProductVariant/10",
                      "tiers": [{ "thresholdQuantity": 3, "targetUnitPrice": "500" }] },
                    { "variantId": "gid://shopify/ProductVariant/11",
                      "tiers": [{ "thresholdQuantity": 1, "targetUnitPrice": "600" }] }
                ]
            }
        })
    }

    fn variant_line(id: &str, variant: &str, quantity: u32, amount: &str, tags: &[(&str, bool)]) -> serde_json::Value {
        json!({
            "id": id,
            "quantity": quantity,
            "cost": { "amountPerQuantity": { "amount": amount, "currencyCode": "USD" } },
            "merchandise": {
                "__typename": "ProductVariant",
                "id": variant,
                "product": {
                    "id": "gid://shopify/Product/1",
                    "vendor": "Acme",
                    "productType": "Mug",
                    "hasTags": tags.iter().map(|(tag, has)| json!({ "tag": tag, "hasTag": has })).collect::<Vec<_>>(),
                    "inAnyCollection": false
                }
            }
        })
    }

    fn input(config: serde_json::Value, lines: Vec<serde_json::Value>, rate: Option<&str>) -> FunctionInput {
        let document = json!({
            "cart": {
                "lines": lines,
                "buyerIdentity": { "email": "buyer@example.com" }
            },
            "presentmentCurrencyRate": rate,
            "discountNode": { "metafield": { "value": config.to_string() } }
        });
        FunctionInput::from_json(&document.to_string()).unwrap()
    }

    #[test]
    fn test_quantity_function_document() {
        let lines = vec![
            variant_line("gid://shopify/CartLine/1", "gid://shopify/ProductVariant/1", 5, "20.00", &[("bulk", true), ("final-sale", false)]),
            variant_line("gid://shopify/CartLine/2", "gid://shopify/ProductVariant/2", 9, "20.00", &[("bulk", true), ("final-sale", true)]),
            variant_line("gid://shopify/CartLine/3", "gid://shopify/ProductVariant/3", 8, "20.00", &[("bulk", true)]),
            json!({
                "id": "gid://shopify/CartLine/4",
                "quantity": 20,
                "cost": { "amountPerQuantity": { "amount": "5.00" } },
                "merchandise": { "__typename": "CustomProduct" }
            }),
        ];
        let result = run_function(DiscountKind::Quantity, &input(quantity_config(), lines, Some("1.1"))).unwrap();

        let output = serde_json::to_value(&result).unwrap();
        assert_eq!(
            output,
            json!({
                "discounts": [
                    {
                        "targets": [{ "productVariant": { "id": "gid://shopify/ProductVariant/1" } }],
                        "value": { "percentage": { "value": "10" } },
                        "message": "Volume discount"
                    },
                    {
                        "targets": [{ "productVariant": { "id": "gid://shopify/ProductVariant/3" } }],
                        "value": { "fixedAmount": { "amount": "11", "appliesToEachItem": true } },
                        "message": "Volume discount"
                    }
                ],
                "discountApplicationStrategy": "ALL"
            })
        );
    }

    #[test]
    fn test_price_function_document() {
        let lines = vec![
            variant_line("l1", "gid://shopify/ProductVariant/10", 3, "550.00", &[]),
            variant_line("l2", "gid://shopify/ProductVariant/11", 1, "550.00", &[]),
            variant_line("l3", "gid://shopify/ProductVariant/12", 10, "550.00", &[]),
        ];
        let result = run_function(DiscountKind::Price, &input(price_config(), lines, Some("1.0"))).unwrap();

        assert_eq!(result.discounts.len(), 2);
        assert_eq!(
            result.discounts[0].value,
            DiscountValue::FixedAmount {
                amount: Money::from_minor(5000),
                applies_to_each_item: true,
            }
        );
        // Target above cart price clamps to zero and is still emitted
        assert_eq!(
            result.discounts[1].value,
            DiscountValue::FixedAmount {
                amount: Money::zero(),
                applies_to_each_item: true,
            }
        );
        assert_eq!(result.discounts[1].message.as_deref(), Some("Case pricing"));
    }

    #[test]
    fn test_no_qualifying_line_is_empty_result() {
        let lines = vec![variant_line("l1", "gid://shopify/ProductVariant/1", 1, "20.00", &[("bulk", true)])];
        let result = run_function(DiscountKind::Quantity, &input(quantity_config(), lines, Some("1"))).unwrap();
        assert_eq!(result, FunctionResult::empty());
    }

    #[test]
    fn test_kind_mismatch_is_error() {
        let err = run_function(DiscountKind::Price, &input(quantity_config(), vec![], Some("1"))).unwrap_err();
        assert!(matches!(
            err,
            CoreError::KindMismatch {
                expected: DiscountKind::Price,
                actual: DiscountKind::Quantity,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_rate_is_error() {
        let err = run_function(DiscountKind::Quantity, &input(quantity_config(), vec![], None)).unwrap_err();
        assert!(matches!(err, CoreError::MissingCurrencyRate));

        let err = run_function(DiscountKind::Quantity, &input(quantity_config(), vec![], Some("0"))).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_overflowing_fixed_amount_is_error() {
        let config = json!({
            "id": "d-huge",
            "rules": {
                "kind": "QUANTITY",
                "applyScope": "ALL_PRODUCTS",
                "tiers": [{
                    "thresholdQuantity": 1,
                    "adjustment": { "type": "FIXED_AMOUNT_PER_UNIT", "amount": "79228162514264337593543950335" }
                }]
            }
        });
        let lines = vec![variant_line("gid://shopify/CartLine/1", "gid://shopify/ProductVariant/1", 1, "20.00", &[])];

        let err = run_function(DiscountKind::Quantity, &input(config, lines, Some("2"))).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { ref discount_id, .. } if discount_id == "d-huge"));
    }

    #[test]
    fn test_missing_or_broken_metafield_is_error() {
        let document = json!({
            "cart": { "lines": [] },
            "presentmentCurrencyRate": "1.0",
            "discountNode": { "metafield": null }
        });
        let parsed = FunctionInput::from_json(&document.to_string()).unwrap();
        assert!(matches!(
            run_function(DiscountKind::Quantity, &parsed),
            Err(CoreError::MissingConfiguration)
        ));

        let broken = json!({ "id": "d", "rules": { "kind": "BUY_X_GET_Y" } });
        assert!(matches!(
            run_function(DiscountKind::Quantity, &input(broken, vec![], Some("1"))),
            Err(CoreError::ConfigurationParse(_))
        ));
    }

    #[test]
    fn test_anonymous_buyer_fails_customer_list() {
        let mut config = quantity_config();
        config["customerEligibility"] = json!({ "mode": "CUSTOMER_LIST", "emails": ["buyer@example.com"] });

        let line = variant_line("l1", "gid://shopify/ProductVariant/1", 5, "20.00", &[("bulk", true)]);
        let signed_in = run_function(DiscountKind::Quantity, &input(config.clone(), vec![line.clone()], Some("1"))).unwrap();
        assert_eq!(signed_in.discounts.len(), 1);

        let mut anonymous = input(config, vec![line], Some("1"));
        anonymous.cart.buyer_identity = None;
        assert!(run_function(DiscountKind::Quantity, &anonymous).unwrap().discounts.is_empty());
    }
}
