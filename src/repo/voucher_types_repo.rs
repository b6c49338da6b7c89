use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::voucher::VoucherType;
use crate::repo::ports::VoucherTypesStore;

#[derive(Clone)]
pub struct VoucherTypesRepo {
    pub pool: PgPool,
}

fn map_type(row: sqlx::postgres::PgRow) -> VoucherType {
    VoucherType {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        value_cents: row.get("value_cents"),
        image_url: row.get("image_url"),
    }
}

#[async_trait]
impl VoucherTypesStore for VoucherTypesRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VoucherType>> {
        let row = sqlx::query(
            "SELECT id, name, description, value_cents, image_url FROM voucher_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_type))
    }

    async fn list(&self) -> Result<Vec<VoucherType>> {
        let rows = sqlx::query(
            "SELECT id, name, description, value_cents, image_url FROM voucher_types ORDER BY value_cents",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_type).collect())
    }
}
