use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{TimeZone, Utc};
use vouchers_api::error::ApiError;

#[test]
fn taxonomy_maps_to_expected_statuses() {
    assert_eq!(
        ApiError::Validation("x".into()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        ApiError::NotFound("x".into()).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    assert_eq!(
        ApiError::VoucherAlreadyUsed { used_at: None }.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        ApiError::PaymentDeclined {
            gateway_status: "UNKNOWN".into()
        }
        .status(),
        StatusCode::PAYMENT_REQUIRED
    );
    assert_eq!(
        ApiError::Gateway("provider down".into()).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        ApiError::CodeGenerationExhausted.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn conflict_body_carries_original_used_at() {
    let used_at = Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap();
    let response = ApiError::VoucherAlreadyUsed {
        used_at: Some(used_at),
    }
    .into_response();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("already used"));
    assert_eq!(
        body["used_at"].as_str().unwrap(),
        used_at.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
    );
}

#[tokio::test]
async fn declined_body_carries_gateway_status() {
    let response = ApiError::PaymentDeclined {
        gateway_status: "OVERDUE".into(),
    }
    .into_response();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "OVERDUE");
    assert!(body["error"].as_str().is_some());
}
