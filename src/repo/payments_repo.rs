use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::payment::{BillingMethod, Payment, PaymentStatus};
use crate::repo::ports::PaymentsStore;

#[derive(Clone)]
pub struct PaymentsRepo {
    pub pool: PgPool,
}

fn map_payment(row: sqlx::postgres::PgRow) -> Result<Payment> {
    let billing: String = row.get("billing_method");
    let status: String = row.get("status");
    Ok(Payment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        voucher_type_id: row.get("voucher_type_id"),
        billing_method: BillingMethod::parse(&billing)
            .ok_or_else(|| anyhow::anyhow!("unknown billing method: {billing}"))?,
        value_cents: row.get("value_cents"),
        status: PaymentStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown payment status: {status}"))?,
        gateway_customer_id: row.get("gateway_customer_id"),
        gateway_payment_id: row.get("gateway_payment_id"),
        pix_encoded_image: row.get("pix_encoded_image"),
        pix_payload: row.get("pix_payload"),
        pix_expiration: row.get("pix_expiration"),
        voucher_id: row.get("voucher_id"),
    })
}

const PAYMENT_COLUMNS: &str = "id, user_id, voucher_type_id, billing_method, value_cents, status, \
     gateway_customer_id, gateway_payment_id, pix_encoded_image, pix_payload, pix_expiration, voucher_id";

#[async_trait]
impl PaymentsStore for PaymentsRepo {
    async fn insert_pending(
        &self,
        user_id: Uuid,
        voucher_type_id: Uuid,
        billing_method: BillingMethod,
        value_cents: i64,
        gateway_customer_id: &str,
    ) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO payments (user_id, voucher_type_id, billing_method, value_cents, status, gateway_customer_id)
            VALUES ($1, $2, $3, $4, 'PENDING', $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(voucher_type_id)
        .bind(billing_method.as_str())
        .bind(value_cents)
        .bind(gateway_customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_payment).transpose()
    }

    async fn find_by_gateway_id(&self, gateway_payment_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE gateway_payment_id = $1"
        ))
        .bind(gateway_payment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_payment).transpose()
    }

    async fn store_pix_artifacts(
        &self,
        id: Uuid,
        gateway_payment_id: &str,
        encoded_image: &str,
        payload: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET gateway_payment_id = $2, pix_encoded_image = $3, pix_payload = $4,
                pix_expiration = $5, status = 'AWAITING_PAYMENT', updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(gateway_payment_id)
        .bind(encoded_image)
        .bind(payload)
        .bind(expiration)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn store_card_result(
        &self,
        id: Uuid,
        gateway_payment_id: &str,
        status: PaymentStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET gateway_payment_id = $2, status = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(gateway_payment_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE payments SET status = $3, updated_at = now() WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn link_voucher_if_unlinked(&self, id: Uuid, voucher_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET voucher_id = $2, status = 'RECEIVED', updated_at = now()
            WHERE id = $1 AND voucher_id IS NULL
            "#,
        )
        .bind(id)
        .bind(voucher_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
