use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::domain::payment::InitiatePaymentRequest;
use crate::domain::user::{AuthUser, Role};
use crate::error::ApiError;
use crate::http::extract::{client_ip, JsonBody};
use crate::AppState;

pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    JsonBody(req): JsonBody<InitiatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user.role != Role::Customer {
        return Err(ApiError::Forbidden);
    }

    let remote_ip = client_ip(&headers);
    let resp = state.workflow.initiate(&user, req, remote_ip).await?;
    Ok(Json(resp))
}

pub async fn payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.workflow.check_status(id, &user).await?;
    Ok(Json(resp))
}
