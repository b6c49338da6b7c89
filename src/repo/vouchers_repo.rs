use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::voucher::{Voucher, VoucherStatus, VoucherTypeSummary, VoucherView};
use crate::repo::ports::{InsertVoucherOutcome, VouchersStore};
use crate::repo::users_repo::constraint_is;

#[derive(Clone)]
pub struct VouchersRepo {
    pub pool: PgPool,
}

fn map_voucher(row: sqlx::postgres::PgRow) -> Result<Voucher> {
    let status: String = row.get("status");
    Ok(Voucher {
        id: row.get("id"),
        code: row.get("code"),
        voucher_type_id: row.get("voucher_type_id"),
        user_id: row.get("user_id"),
        payment_id: row.get("payment_id"),
        status: VoucherStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown voucher status: {status}"))?,
        used_at: row.get("used_at"),
        validated_by: row.get("validated_by"),
        created_at: row.get("created_at"),
    })
}

const VOUCHER_COLUMNS: &str =
    "id, code, voucher_type_id, user_id, payment_id, status, used_at, validated_by, created_at";

#[async_trait]
impl VouchersStore for VouchersRepo {
    async fn insert(
        &self,
        code: &str,
        voucher_type_id: Uuid,
        user_id: Uuid,
        payment_id: Option<Uuid>,
    ) -> Result<InsertVoucherOutcome> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO vouchers (code, voucher_type_id, user_id, payment_id, status)
            VALUES ($1, $2, $3, $4, 'active')
            RETURNING {VOUCHER_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(voucher_type_id)
        .bind(user_id)
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertVoucherOutcome::Inserted(map_voucher(row)?)),
            Err(e) if constraint_is(&e, "vouchers_code_key") => {
                Ok(InsertVoucherOutcome::CodeCollision)
            }
            Err(e) if constraint_is(&e, "vouchers_payment_id_key") => {
                Ok(InsertVoucherOutcome::PaymentAlreadyIssued)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_voucher).transpose()
    }

    async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE payment_id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_voucher).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_voucher).transpose()
    }

    async fn find_view_by_code(&self, code: &str) -> Result<Option<VoucherView>> {
        let row = sqlx::query(
            r#"
            SELECT v.id, v.code, v.status, v.used_at,
                   t.name AS type_name, t.value_cents AS type_value, t.description AS type_description
            FROM vouchers v
            JOIN voucher_types t ON t.id = v.voucher_type_id
            WHERE v.code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let status: String = r.get("status");
            Ok(VoucherView {
                id: r.get("id"),
                code: r.get("code"),
                status: VoucherStatus::parse(&status)
                    .ok_or_else(|| anyhow::anyhow!("unknown voucher status: {status}"))?,
                used_at: r.get("used_at"),
                voucher_type: VoucherTypeSummary {
                    name: r.get("type_name"),
                    value_cents: r.get("type_value"),
                    description: r.get("type_description"),
                },
            })
        })
        .transpose()
    }

    async fn redeem_if_active(&self, code: &str, validator_id: Uuid) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE vouchers
            SET status = 'used', used_at = now(), validated_by = $2
            WHERE code = $1 AND status = 'active'
            RETURNING {VOUCHER_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(validator_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_voucher).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Voucher>> {
        let rows = sqlx::query(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_voucher).collect()
    }
}
