use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::payment::{BillingMethod, Payment, PaymentStatus};
use crate::domain::voucher::{Voucher, VoucherType, VoucherView};

/// Insert outcomes the issuance paths need to tell apart: a code collision
/// is retried with a fresh code, a payment collision means a concurrent
/// caller already issued for this payment.
pub enum InsertVoucherOutcome {
    Inserted(Voucher),
    CodeCollision,
    PaymentAlreadyIssued,
}

#[async_trait]
pub trait PaymentsStore: Send + Sync {
    async fn insert_pending(
        &self,
        user_id: Uuid,
        voucher_type_id: Uuid,
        billing_method: BillingMethod,
        value_cents: i64,
        gateway_customer_id: &str,
    ) -> Result<Uuid>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;

    async fn find_by_gateway_id(&self, gateway_payment_id: &str) -> Result<Option<Payment>>;

    async fn store_pix_artifacts(
        &self,
        id: Uuid,
        gateway_payment_id: &str,
        encoded_image: &str,
        payload: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()>;

    async fn store_card_result(
        &self,
        id: Uuid,
        gateway_payment_id: &str,
        status: PaymentStatus,
    ) -> Result<()>;

    /// Compare-and-set status update. Returns false when the row was no
    /// longer in `from`, which is how the poll and webhook paths detect
    /// they lost a race.
    async fn transition_status(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool>;

    /// Atomic "link only if unlinked": the storage-level guard that keeps a
    /// payment tied to at most one voucher.
    async fn link_voucher_if_unlinked(&self, id: Uuid, voucher_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait VouchersStore: Send + Sync {
    async fn insert(
        &self,
        code: &str,
        voucher_type_id: Uuid,
        user_id: Uuid,
        payment_id: Option<Uuid>,
    ) -> Result<InsertVoucherOutcome>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Voucher>>;

    async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<Voucher>>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>>;

    async fn find_view_by_code(&self, code: &str) -> Result<Option<VoucherView>>;

    /// Single-use redemption: the conditional update is the mutual
    /// exclusion, so of two simultaneous attempts exactly one flips the row.
    async fn redeem_if_active(&self, code: &str, validator_id: Uuid) -> Result<Option<Voucher>>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Voucher>>;
}

#[async_trait]
pub trait VoucherTypesStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VoucherType>>;

    async fn list(&self) -> Result<Vec<VoucherType>>;
}
