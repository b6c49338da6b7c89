use anyhow::Result;
use sqlx::PgPool;

/// Persists swallowed webhook-path failures so operations can follow up.
/// The webhook handler never surfaces these to the gateway.
#[derive(Clone)]
pub struct WebhookFailuresRepo {
    pub pool: PgPool,
}

impl WebhookFailuresRepo {
    pub async fn insert(
        &self,
        gateway_payment_id: Option<&str>,
        event_type: &str,
        error_message: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO webhook_failures (gateway_payment_id, event_type, error_message, payload)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(gateway_payment_id)
        .bind(event_type)
        .bind(error_message)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
