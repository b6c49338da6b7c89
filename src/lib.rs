pub mod codes;
pub mod config;
pub mod domain {
    pub mod payment;
    pub mod transitions;
    pub mod user;
    pub mod voucher;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod extract;
    pub mod handlers {
        pub mod auth;
        pub mod payments;
        pub mod validation;
        pub mod vouchers;
        pub mod webhooks;
    }
}
pub mod repo {
    pub mod in_memory;
    pub mod payments_repo;
    pub mod ports;
    pub mod users_repo;
    pub mod voucher_types_repo;
    pub mod vouchers_repo;
    pub mod webhook_failures_repo;
}
pub mod service {
    pub mod auth;
    pub mod issuance;
    pub mod payment_workflow;
    pub mod validation;
}

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

#[derive(Clone)]
pub struct AppState {
    pub workflow: service::payment_workflow::PaymentWorkflow,
    pub issuance: service::issuance::IssuanceService,
    pub validation: service::validation::ValidationService,
    pub auth: service::auth::AuthService,
    pub vouchers: Arc<dyn repo::ports::VouchersStore>,
    pub voucher_types: Arc<dyn repo::ports::VoucherTypesStore>,
    pub webhook_failures: repo::webhook_failures_repo::WebhookFailuresRepo,
    pub webhook_token: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(http::handlers::auth::register))
        .route("/auth/login", post(http::handlers::auth::login))
        .route("/auth/logout", post(http::handlers::auth::logout))
        .route("/auth/me", get(http::handlers::auth::me))
        .route("/payments", post(http::handlers::payments::create_payment))
        .route(
            "/payments/:id/status",
            get(http::handlers::payments::payment_status),
        )
        .route("/webhooks/asaas", post(http::handlers::webhooks::asaas_webhook))
        .route(
            "/vouchers",
            get(http::handlers::vouchers::list_my_vouchers)
                .post(http::handlers::vouchers::create_voucher),
        )
        .route(
            "/voucher-types",
            get(http::handlers::vouchers::list_voucher_types),
        )
        .route(
            "/validar",
            get(http::handlers::validation::lookup_voucher)
                .post(http::handlers::validation::redeem_voucher),
        )
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}
