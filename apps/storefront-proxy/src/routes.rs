//! # Request Handlers
//!
//! ## Preview Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /proxy/discounts?shop=..&timestamp=..&signature=..                │
//! │  body: variant_id, product_quantity, product_tags, ...                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. verify signature and timestamp (signed query) ──► 401               │
//! │  2. parse form into a variant context             ──► 400               │
//! │     (signed shop / customer id win over the form)                       │
//! │  3. shop installed?                               ──► 404               │
//! │     customer id ──► email (customers table)                             │
//! │  4. active discounts for the shop                 ──► 500 if invalid    │
//! │  5. merge_preview + mark_selected at product_quantity                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { "response": "success", "data": [...], "settings": {...} }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Form, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tierline_core::types::{CollectionMembership, VariantDetails};
use tierline_core::{mark_selected, merge_preview, CustomerContext, PreviewEntry, StorefrontSettings};

use crate::auth;
use crate::error::{ProxyError, ProxyResult};
use crate::AppState;

// =============================================================================
// Response Envelope
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The envelope the storefront block reads.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub response: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<PreviewEntry>,
    pub settings: StorefrontSettings,
}

impl PreviewResponse {
    pub fn success(data: Vec<PreviewEntry>, settings: StorefrontSettings) -> Self {
        PreviewResponse {
            response: ResponseStatus::Success,
            message: None,
            data,
            settings,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        PreviewResponse {
            response: ResponseStatus::Error,
            message: Some(message.into()),
            data: Vec::new(),
            settings: StorefrontSettings::default(),
        }
    }
}

// =============================================================================
// Request Form
// =============================================================================

/// Fields the storefront block sends. Everything arrives as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewForm {
    pub variant_id: Option<String>,
    pub product_id: Option<String>,
    pub product_quantity: Option<String>,
    /// Comma-separated
    pub product_tags: Option<String>,
    pub product_vendor: Option<String>,
    pub product_type: Option<String>,
    /// Comma-separated
    pub product_collection_ids: Option<String>,
    pub logged_in_customer_id: Option<String>,
    pub shop_domain: Option<String>,
}

/// A validated preview request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    pub shop: String,
    pub variant: VariantDetails,
    pub quantity: u32,
    pub customer_id: Option<String>,
}

impl PreviewRequest {
    /// Builds a request from the form and the signed query.
    ///
    /// The signed `shop` and `logged_in_customer_id` query parameters are
    /// authoritative. `shop_domain` and `logged_in_customer_id` form fields
    /// are used only when the signed parameter is absent, and a form value
    /// that disagrees with the signed one is rejected.
    pub fn from_form(form: PreviewForm, signed: &[(String, String)]) -> ProxyResult<Self> {
        let shop = resolve_signed("shop_domain", form.shop_domain, signed_value(signed, "shop"))?
            .ok_or_else(|| ProxyError::BadRequest("shop_domain is required".to_string()))?;

        let customer_id = resolve_signed(
            "logged_in_customer_id",
            form.logged_in_customer_id,
            signed_value(signed, "logged_in_customer_id"),
        )?;

        let variant_id = non_empty(form.variant_id)
            .ok_or_else(|| ProxyError::BadRequest("variant_id is required".to_string()))?;

        let quantity = match non_empty(form.product_quantity) {
            None => 1,
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                ProxyError::BadRequest(format!("product_quantity '{}' is not a whole number", raw))
            })?,
        };

        let variant = VariantDetails {
            variant_id: to_gid("ProductVariant", &variant_id),
            product_id: non_empty(form.product_id).map(|id| to_gid("Product", &id)),
            product_tags: split_list(form.product_tags),
            vendor: non_empty(form.product_vendor),
            product_type: non_empty(form.product_type),
            collections: CollectionMembership::Ids(
                split_list(form.product_collection_ids)
                    .iter()
                    .map(|id| to_gid("Collection", id))
                    .collect(),
            ),
        };

        Ok(PreviewRequest {
            shop,
            variant,
            quantity,
            customer_id,
        })
    }
}

/// `None` when the key is not in the signed query, `Some(None)` when it is
/// present but empty (a logged out shopper).
fn signed_value(signed: &[(String, String)], key: &str) -> Option<Option<String>> {
    signed
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| non_empty(Some(v.clone())))
}

fn resolve_signed(
    field: &str,
    form_value: Option<String>,
    signed_value: Option<Option<String>>,
) -> ProxyResult<Option<String>> {
    let form_value = non_empty(form_value);
    match signed_value {
        None => Ok(form_value),
        Some(signed_value) => match form_value {
            Some(claimed) if signed_value.as_ref() != Some(&claimed) => Err(ProxyError::BadRequest(
                format!("{} does not match the signed request", field),
            )),
            _ => Ok(signed_value),
        },
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: Option<String>) -> BTreeSet<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Liquid exposes numeric ids; configurations store global ids.
fn to_gid(resource: &str, id: &str) -> String {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        format!("gid://shopify/{}/{}", resource, id)
    } else {
        id.to_string()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
    }
}

/// `POST` preview: form fields in the body.
pub async fn preview_post(
    State(state): State<Arc<AppState>>,
    signed: Result<Query<Vec<(String, String)>>, QueryRejection>,
    form: Result<Form<PreviewForm>, FormRejection>,
) -> ProxyResult<Json<PreviewResponse>> {
    let Query(signed) = signed.map_err(|e| ProxyError::BadRequest(e.body_text()))?;
    verify_signature(&state, &signed)?;
    let Form(form) = form.map_err(|e| ProxyError::BadRequest(e.body_text()))?;
    preview(&state, &signed, form).await.map(Json)
}

/// `GET` preview: form fields in the query, next to the signature.
pub async fn preview_get(
    State(state): State<Arc<AppState>>,
    signed: Result<Query<Vec<(String, String)>>, QueryRejection>,
    form: Result<Query<PreviewForm>, QueryRejection>,
) -> ProxyResult<Json<PreviewResponse>> {
    let Query(signed) = signed.map_err(|e| ProxyError::BadRequest(e.body_text()))?;
    verify_signature(&state, &signed)?;
    let Query(form) = form.map_err(|e| ProxyError::BadRequest(e.body_text()))?;
    preview(&state, &signed, form).await.map(Json)
}

fn verify_signature(state: &AppState, signed: &[(String, String)]) -> ProxyResult<()> {
    if !state.config.signature_required {
        return Ok(());
    }
    let secret = state
        .config
        .api_secret
        .as_deref()
        .ok_or_else(|| ProxyError::Internal("Signature required but no secret configured".to_string()))?;
    auth::verify(signed, secret)?;

    if let Some(max_age) = state.config.signature_max_age_secs {
        auth::verify_timestamp(signed, Utc::now().timestamp(), max_age)?;
    }
    Ok(())
}

async fn preview(
    state: &AppState,
    signed: &[(String, String)],
    form: PreviewForm,
) -> ProxyResult<PreviewResponse> {
    let request = PreviewRequest::from_form(form, signed)?;

    if !state.db.shops().exists(&request.shop).await? {
        return Err(ProxyError::UnknownShop(request.shop));
    }

    let customer = match &request.customer_id {
        Some(id) => CustomerContext {
            email: state.db.customers().email_for(&request.shop, id).await?,
        },
        None => CustomerContext::anonymous(),
    };

    let configs = state.db.discounts().list_active_for_shop(&request.shop).await?;
    let settings = state.db.shops().settings(&request.shop).await?;

    let mut entries = merge_preview(&configs, &request.variant, &customer, Utc::now());
    let selected = mark_selected(&mut entries, request.quantity);

    debug!(
        shop = %request.shop,
        customer_known = customer.email.is_some(),
        configs = configs.len(),
        "Preview computed"
    );
    info!(
        shop = %request.shop,
        variant_id = %request.variant.variant_id,
        quantity = request.quantity,
        entries = entries.len(),
        selected = ?selected,
        "Preview served"
    );

    Ok(PreviewResponse::success(entries, settings))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_form_parsing() {
        let form = PreviewForm {
            variant_id: Some("42".to_string()),
            product_id: Some("gid://shopify/Product/7".to_string()),
            product_quantity: Some(" 3 ".to_string()),
            product_tags: Some("bulk, summer,,".to_string()),
            product_vendor: Some("Acme".to_string()),
            product_type: Some("".to_string()),
            product_collection_ids: Some("100,200".to_string()),
            logged_in_customer_id: None,
            shop_domain: Some("demo.myshopify.com".to_string()),
        };
        let request = PreviewRequest::from_form(form, &[]).unwrap();

        assert_eq!(request.shop, "demo.myshopify.com");
        assert_eq!(request.quantity, 3);
        assert_eq!(request.variant.variant_id, "gid://shopify/ProductVariant/42");
        assert_eq!(request.variant.product_id.as_deref(), Some("gid://shopify/Product/7"));
        assert_eq!(request.variant.product_tags.len(), 2);
        assert_eq!(request.variant.product_type, None);
        assert_eq!(
            request.variant.collections,
            CollectionMembership::Ids(
                ["gid://shopify/Collection/100", "gid://shopify/Collection/200"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            )
        );
    }

    #[test]
    fn test_shop_and_customer_come_from_signed_query() {
        let form = PreviewForm {
            variant_id: Some("1".to_string()),
            ..Default::default()
        };
        let query = signed(&[("shop", "signed.myshopify.com"), ("logged_in_customer_id", "9")]);
        let request = PreviewRequest::from_form(form, &query).unwrap();

        assert_eq!(request.shop, "signed.myshopify.com");
        assert_eq!(request.customer_id.as_deref(), Some("9"));
        assert_eq!(request.quantity, 1);

        // Agreeing form values are fine
        let form = PreviewForm {
            variant_id: Some("1".to_string()),
            shop_domain: Some("signed.myshopify.com".to_string()),
            logged_in_customer_id: Some("9".to_string()),
            ..Default::default()
        };
        let request = PreviewRequest::from_form(form, &query).unwrap();
        assert_eq!(request.shop, "signed.myshopify.com");
        assert_eq!(request.customer_id.as_deref(), Some("9"));
    }

    #[test]
    fn test_form_cannot_override_signed_identity() {
        let query = signed(&[("shop", "signed.myshopify.com"), ("logged_in_customer_id", "5")]);

        let other_shop = PreviewForm {
            variant_id: Some("1".to_string()),
            shop_domain: Some("other.myshopify.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PreviewRequest::from_form(other_shop, &query),
            Err(ProxyError::BadRequest(_))
        ));

        let other_customer = PreviewForm {
            variant_id: Some("1".to_string()),
            logged_in_customer_id: Some("1001".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PreviewRequest::from_form(other_customer, &query),
            Err(ProxyError::BadRequest(_))
        ));

        // Logged out shopper: the signed value is present but empty
        let logged_out = signed(&[("shop", "signed.myshopify.com"), ("logged_in_customer_id", "")]);
        let claimed = PreviewForm {
            variant_id: Some("1".to_string()),
            logged_in_customer_id: Some("1001".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PreviewRequest::from_form(claimed, &logged_out),
            Err(ProxyError::BadRequest(_))
        ));
        let anonymous = PreviewForm {
            variant_id: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(PreviewRequest::from_form(anonymous, &logged_out).unwrap().customer_id, None);
    }

    #[test]
    fn test_bad_requests() {
        let no_variant = PreviewForm {
            shop_domain: Some("demo.myshopify.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PreviewRequest::from_form(no_variant, &[]),
            Err(ProxyError::BadRequest(_))
        ));

        let no_shop = PreviewForm {
            variant_id: Some("1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PreviewRequest::from_form(no_shop, &[]),
            Err(ProxyError::BadRequest(_))
        ));

        let bad_quantity = PreviewForm {
            variant_id: Some("1".to_string()),
            shop_domain: Some("demo.myshopify.com".to_string()),
            product_quantity: Some("-2".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PreviewRequest::from_form(bad_quantity, &[]),
            Err(ProxyError::BadRequest(_))
        ));
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(PreviewResponse::error("nope")).unwrap();
        assert_eq!(json["response"], "error");
        assert_eq!(json["message"], "nope");
        assert_eq!(json["data"], serde_json::json!([]));
        assert!(json["settings"].is_object());

        let json = serde_json::to_value(PreviewResponse::success(vec![], StorefrontSettings::default())).unwrap();
        assert_eq!(json["response"], "success");
        assert!(json.get("message").is_none());
    }
}
