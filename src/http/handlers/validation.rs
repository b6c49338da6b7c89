use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::domain::user::{AuthUser, Role};
use crate::domain::voucher::VoucherStatus;
use crate::error::ApiError;
use crate::http::extract::JsonBody;
use crate::AppState;

#[derive(Deserialize)]
pub struct LookupQuery {
    pub code: Option<String>,
}

/// GET /validar?code= — any authenticated user may check a code.
pub async fn lookup_voucher(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let code = query
        .code
        .ok_or_else(|| ApiError::Validation("code is required".to_string()))?;

    let view = state.validation.lookup(&code).await?;
    Ok(Json(json!({
        "valid": view.status == VoucherStatus::Active,
        "voucher": view,
    })))
}

#[derive(Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// POST /validar — validator role only; single-use redemption.
pub async fn redeem_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<RedeemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user.role != Role::Validator {
        return Err(ApiError::Forbidden);
    }

    let (voucher, voucher_type) = state.validation.redeem(&req.code, &user).await?;
    Ok(Json(json!({
        "success": true,
        "used_at": voucher.used_at,
        "voucher_type": {
            "name": voucher_type.name,
            "value_cents": voucher_type.value_cents,
        },
    })))
}
