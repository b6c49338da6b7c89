use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::user::{AuthUser, Role};
use crate::error::ApiError;
use crate::http::extract::JsonBody;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateVoucherRequest {
    pub voucher_type_id: Uuid,
}

/// Direct no-payment issuance.
pub async fn create_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateVoucherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user.role != Role::Customer {
        return Err(ApiError::Forbidden);
    }

    state
        .voucher_types
        .find_by_id(req.voucher_type_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("voucher type not found".to_string()))?;

    let issued = state.issuance.issue_direct(user.id, req.voucher_type_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": issued.id, "code": issued.code })),
    ))
}

pub async fn list_my_vouchers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let vouchers = state.vouchers.list_by_user(user.id).await?;
    let items: Vec<_> = vouchers
        .into_iter()
        .map(|v| {
            json!({
                "id": v.id,
                "code": v.code,
                "status": v.status,
                "used_at": v.used_at,
                "voucher_type_id": v.voucher_type_id,
                "created_at": v.created_at,
            })
        })
        .collect();
    Ok(Json(json!({ "vouchers": items })))
}

pub async fn list_voucher_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let types = state.voucher_types.list().await?;
    Ok(Json(json!({ "voucher_types": types })))
}
