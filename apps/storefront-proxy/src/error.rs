//! Error types for the storefront proxy.
//!
//! Every error leaves as the same JSON envelope the storefront block expects
//! on success, with `response: "error"` and a `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tierline_core::CoreError;
use tierline_db::DbError;
use tracing::{error, warn};

use crate::routes::PreviewResponse;

/// Storefront proxy errors.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Missing app proxy signature")]
    MissingSignature,

    #[error("Invalid app proxy signature")]
    InvalidSignature,

    #[error("App proxy signature has expired")]
    StaleSignature,

    #[error("Shop {0} is not installed")]
    UnknownShop(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Discount configuration error: {0}")]
    Configuration(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ProxyError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvalidRecord { source, .. } => ProxyError::Configuration(source),
            other => ProxyError::Database(other),
        }
    }
}

impl ProxyError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingSignature
            | ProxyError::InvalidSignature
            | ProxyError::StaleSignature => StatusCode::UNAUTHORIZED,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::UnknownShop(_) => StatusCode::NOT_FOUND,
            ProxyError::Configuration(_) | ProxyError::Database(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Preview request failed");
        } else {
            warn!(error = %self, "Preview request rejected");
        }

        (status, Json(PreviewResponse::error(self.to_string()))).into_response()
    }
}

/// Result type for request handlers.
pub type ProxyResult<T> = Result<T, ProxyError>;
