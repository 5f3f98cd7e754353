//! # App Proxy Signature
//!
//! Verifies that a storefront request really came through the shop's app
//! proxy.
//!
//! ## Signed Message
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ?shop=demo.myshopify.com&timestamp=1700000000&ids=1&ids=2&signature=ab │
//! │                                                                         │
//! │  1. drop `signature`                                                    │
//! │  2. join repeated keys with ","        ids=1,2                          │
//! │  3. sort by key, render key=value      ids=1,2 shop=... timestamp=...   │
//! │  4. concatenate, no separator          ids=1,2shop=...timestamp=...     │
//! │  5. HMAC-SHA256 with the app secret, hex encoded == signature           │
//! │  6. |now − timestamp| within the configured age                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ProxyError;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// Signed query parameter carrying the request time (Unix seconds).
pub const TIMESTAMP_PARAM: &str = "timestamp";

/// Builds the message the app proxy signs.
pub fn signature_message(params: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in params {
        if key == SIGNATURE_PARAM {
            continue;
        }
        grouped.entry(key.as_str()).or_default().push(value.as_str());
    }

    grouped
        .into_iter()
        .map(|(key, values)| format!("{}={}", key, values.join(",")))
        .collect()
}

/// Signs query parameters the way the app proxy does.
pub fn sign(params: &[(String, String)], secret: &str) -> Result<String, ProxyError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ProxyError::Internal(e.to_string()))?;
    mac.update(signature_message(params).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies the `signature` query parameter.
///
/// The comparison is constant time.
pub fn verify(params: &[(String, String)], secret: &str) -> Result<(), ProxyError> {
    let signature = params
        .iter()
        .find(|(key, _)| key == SIGNATURE_PARAM)
        .map(|(_, value)| value.as_str())
        .ok_or(ProxyError::MissingSignature)?;

    let expected = hex::decode(signature).map_err(|_| ProxyError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ProxyError::Internal(e.to_string()))?;
    mac.update(signature_message(params).as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| ProxyError::InvalidSignature)
}

/// Rejects signed requests whose `timestamp` is further than `max_age_secs`
/// from `now` in either direction.
///
/// Call after [`verify`]; the timestamp is only meaningful once signed.
pub fn verify_timestamp(
    params: &[(String, String)],
    now: i64,
    max_age_secs: u64,
) -> Result<(), ProxyError> {
    let timestamp = params
        .iter()
        .find(|(key, _)| key == TIMESTAMP_PARAM)
        .ok_or(ProxyError::StaleSignature)?
        .1
        .parse::<i64>()
        .map_err(|_| ProxyError::StaleSignature)?;

    if now.abs_diff(timestamp) > max_age_secs {
        return Err(ProxyError::StaleSignature);
    }
    Ok(())
}
