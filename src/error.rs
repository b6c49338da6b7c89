use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::gateways::GatewayError;

/// Request-level error taxonomy. Every variant maps to one HTTP status and a
/// `{"error": "..."}` body; a few carry extra fields the frontend displays
/// inline (the original `used_at` on a double redemption, the provider
/// status on a declined card).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("not authenticated")]
    Unauthenticated,

    #[error("invalid login id or password")]
    InvalidCredentials,

    #[error("access denied")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("voucher already used")]
    VoucherAlreadyUsed { used_at: Option<DateTime<Utc>> },

    #[error("payment declined")]
    PaymentDeclined { gateway_status: String },

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("could not generate a unique code")]
    CodeGenerationExhausted,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::VoucherAlreadyUsed { .. } => StatusCode::CONFLICT,
            ApiError::PaymentDeclined { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::Gateway(_)
            | ApiError::CodeGenerationExhausted
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        ApiError::Gateway(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            ApiError::VoucherAlreadyUsed { used_at } => json!({
                "error": self.to_string(),
                "used_at": used_at,
            }),
            ApiError::PaymentDeclined { gateway_status } => json!({
                "error": self.to_string(),
                "status": gateway_status,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
