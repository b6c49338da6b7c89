use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use vouchers_api::config::AppConfig;
use vouchers_api::gateways::asaas::AsaasGateway;
use vouchers_api::repo::payments_repo::PaymentsRepo;
use vouchers_api::repo::ports::{PaymentsStore, VouchersStore, VoucherTypesStore};
use vouchers_api::repo::users_repo::UsersRepo;
use vouchers_api::repo::voucher_types_repo::VoucherTypesRepo;
use vouchers_api::repo::vouchers_repo::VouchersRepo;
use vouchers_api::repo::webhook_failures_repo::WebhookFailuresRepo;
use vouchers_api::service::auth::AuthService;
use vouchers_api::service::issuance::IssuanceService;
use vouchers_api::service::payment_workflow::PaymentWorkflow;
use vouchers_api::service::validation::ValidationService;
use vouchers_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let users_repo = UsersRepo { pool: pool.clone() };
    let webhook_failures = WebhookFailuresRepo { pool: pool.clone() };
    let payments: Arc<dyn PaymentsStore> = Arc::new(PaymentsRepo { pool: pool.clone() });
    let vouchers: Arc<dyn VouchersStore> = Arc::new(VouchersRepo { pool: pool.clone() });
    let voucher_types: Arc<dyn VoucherTypesStore> =
        Arc::new(VoucherTypesRepo { pool: pool.clone() });

    let gateway = Arc::new(AsaasGateway {
        base_url: cfg.asaas_base_url.clone(),
        api_key: cfg.asaas_api_key.clone(),
        timeout_ms: cfg.gateway_timeout_ms,
        client: reqwest::Client::new(),
    });

    let issuance = IssuanceService {
        payments: payments.clone(),
        vouchers: vouchers.clone(),
    };

    let workflow = PaymentWorkflow {
        payments,
        vouchers: vouchers.clone(),
        voucher_types: voucher_types.clone(),
        issuance: issuance.clone(),
        gateway,
    };

    let validation = ValidationService {
        vouchers: vouchers.clone(),
        voucher_types: voucher_types.clone(),
    };

    let auth = AuthService {
        users_repo,
        jwt_secret: cfg.jwt_secret.clone(),
    };

    let state = AppState {
        workflow,
        issuance,
        validation,
        auth,
        vouchers,
        voucher_types,
        webhook_failures,
        webhook_token: cfg.asaas_webhook_token.clone(),
    };

    let app = vouchers_api::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
