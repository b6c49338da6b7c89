use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherStatus {
    Active,
    Used,
}

impl VoucherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Active => "active",
            VoucherStatus::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<VoucherStatus> {
        match s {
            "active" => Some(VoucherStatus::Active),
            "used" => Some(VoucherStatus::Used),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Voucher {
    pub id: Uuid,
    pub code: String,
    pub voucher_type_id: Uuid,
    pub user_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub status: VoucherStatus,
    pub used_at: Option<DateTime<Utc>>,
    pub validated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoucherType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub value_cents: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoucherTypeSummary {
    pub name: String,
    pub value_cents: i64,
    pub description: Option<String>,
}

/// Shape returned by the lookup endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct VoucherView {
    pub id: Uuid,
    pub code: String,
    pub status: VoucherStatus,
    pub used_at: Option<DateTime<Utc>>,
    pub voucher_type: VoucherTypeSummary,
}
