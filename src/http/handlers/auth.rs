use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::domain::user::AuthUser;
use crate::error::ApiError;
use crate::http::extract::{clear_session_cookie, session_cookie, JsonBody};
use crate::service::auth::{LoginRequest, RegisterRequest};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.auth.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "login_id": resp.login_id,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state.auth.login(req).await?;
    Ok((
        [(SET_COOKIE, session_cookie(&token))],
        Json(json!({
            "user": {
                "id": user.id,
                "login_id": user.login_id,
                "name": user.name,
                "role": user.role,
            }
        })),
    ))
}

pub async fn logout() -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_session_cookie())],
        Json(json!({ "success": true })),
    )
}

pub async fn me(user: AuthUser) -> impl IntoResponse {
    Json(json!({ "user": user }))
}
