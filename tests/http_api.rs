use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;
use vouchers_api::gateways::mock::MockGateway;
use vouchers_api::repo::in_memory::{
    InMemoryPaymentsStore, InMemoryVouchersStore, InMemoryVoucherTypesStore,
};
use vouchers_api::repo::ports::{PaymentsStore, VouchersStore, VoucherTypesStore};
use vouchers_api::repo::users_repo::UsersRepo;
use vouchers_api::repo::webhook_failures_repo::WebhookFailuresRepo;
use vouchers_api::service::auth::AuthService;
use vouchers_api::service::issuance::IssuanceService;
use vouchers_api::service::payment_workflow::PaymentWorkflow;
use vouchers_api::service::validation::ValidationService;
use vouchers_api::domain::voucher::VoucherType;
use vouchers_api::AppState;

const WEBHOOK_TOKEN: &str = "whsec_test";

/// App wired against in-memory stores. The user and webhook-failure repos
/// get a lazy pool that never connects; no test below reaches them.
async fn app() -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();

    let types_store = InMemoryVoucherTypesStore::new();
    types_store
        .put(VoucherType {
            id: Uuid::new_v4(),
            name: "Day pass".to_string(),
            description: "One day of access".to_string(),
            value_cents: 5000,
            image_url: None,
        })
        .await;

    let payments: Arc<dyn PaymentsStore> = Arc::new(InMemoryPaymentsStore::new());
    let vouchers: Arc<dyn VouchersStore> =
        Arc::new(InMemoryVouchersStore::new(types_store.clone()));
    let voucher_types: Arc<dyn VoucherTypesStore> = Arc::new(types_store);

    let issuance = IssuanceService {
        payments: payments.clone(),
        vouchers: vouchers.clone(),
    };
    let workflow = PaymentWorkflow {
        payments,
        vouchers: vouchers.clone(),
        voucher_types: voucher_types.clone(),
        issuance: issuance.clone(),
        gateway: Arc::new(MockGateway::new("")),
    };
    let validation = ValidationService {
        vouchers: vouchers.clone(),
        voucher_types: voucher_types.clone(),
    };
    let auth = AuthService {
        users_repo: UsersRepo { pool: pool.clone() },
        jwt_secret: "test-secret".to_string(),
    };

    vouchers_api::router(AppState {
        workflow,
        issuance,
        validation,
        auth,
        vouchers,
        voucher_types,
        webhook_failures: WebhookFailuresRepo { pool },
        webhook_token: Some(WEBHOOK_TOKEN.to_string()),
    })
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn register_with_missing_fields_gets_a_400_json_error() {
    let response = app()
        .await
        .oneshot(post_json(
            "/auth/register",
            json!({
                "name": "Maria Silva",
                "email": "maria@example.com",
                "password": "secret1",
            })
            .to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string(), "expected an error envelope, got {body}");
}

#[tokio::test]
async fn malformed_json_gets_a_400_json_error() {
    let response = app()
        .await
        .oneshot(post_json("/auth/login", "{not json".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn payment_creation_without_a_session_is_unauthorized() {
    let response = app()
        .await
        .oneshot(post_json("/payments", json!({}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn webhook_with_a_bad_token_is_rejected() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/asaas")
                .header(CONTENT_TYPE, "application/json")
                .header("asaas-access-token", "wrong")
                .body(Body::from(json!({ "event": "PAYMENT_RECEIVED" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_acknowledges_unparseable_bodies() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/asaas")
                .header(CONTENT_TYPE, "application/json")
                .header("asaas-access-token", WEBHOOK_TOKEN)
                .body(Body::from("not json at all"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["received"], json!(true));
}

#[tokio::test]
async fn webhook_acknowledges_unknown_payments() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/asaas")
                .header(CONTENT_TYPE, "application/json")
                .header("asaas-access-token", WEBHOOK_TOKEN)
                .body(Body::from(
                    json!({
                        "event": "PAYMENT_RECEIVED",
                        "payment": { "id": "pay_does_not_exist" },
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["received"], json!(true));
}
