use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::payment::{BillingMethod, Payment, PaymentStatus};
use crate::domain::voucher::{Voucher, VoucherStatus, VoucherType, VoucherTypeSummary, VoucherView};
use crate::repo::ports::{
    InsertVoucherOutcome, PaymentsStore, VouchersStore, VoucherTypesStore,
};

/// In-memory stores mirroring the Postgres repos, including the constraint
/// semantics the issuance and redemption paths lean on (unique code, unique
/// payment link, conditional updates). They back the workflow tests.
#[derive(Default, Clone)]
pub struct InMemoryPaymentsStore {
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
}

impl InMemoryPaymentsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentsStore for InMemoryPaymentsStore {
    async fn insert_pending(
        &self,
        user_id: Uuid,
        voucher_type_id: Uuid,
        billing_method: BillingMethod,
        value_cents: i64,
        gateway_customer_id: &str,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let payment = Payment {
            id,
            user_id,
            voucher_type_id,
            billing_method,
            value_cents,
            status: PaymentStatus::Pending,
            gateway_customer_id: Some(gateway_customer_id.to_string()),
            gateway_payment_id: None,
            pix_encoded_image: None,
            pix_payload: None,
            pix_expiration: None,
            voucher_id: None,
        };
        self.payments.write().await.insert(id, payment);
        Ok(id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn find_by_gateway_id(&self, gateway_payment_id: &str) -> Result<Option<Payment>> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .find(|p| p.gateway_payment_id.as_deref() == Some(gateway_payment_id))
            .cloned())
    }

    async fn store_pix_artifacts(
        &self,
        id: Uuid,
        gateway_payment_id: &str,
        encoded_image: &str,
        payload: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut payments = self.payments.write().await;
        if let Some(p) = payments.get_mut(&id) {
            p.gateway_payment_id = Some(gateway_payment_id.to_string());
            p.pix_encoded_image = Some(encoded_image.to_string());
            p.pix_payload = Some(payload.to_string());
            p.pix_expiration = expiration;
            p.status = PaymentStatus::AwaitingPayment;
        }
        Ok(())
    }

    async fn store_card_result(
        &self,
        id: Uuid,
        gateway_payment_id: &str,
        status: PaymentStatus,
    ) -> Result<()> {
        let mut payments = self.payments.write().await;
        if let Some(p) = payments.get_mut(&id) {
            p.gateway_payment_id = Some(gateway_payment_id.to_string());
            p.status = status;
        }
        Ok(())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&id) {
            Some(p) if p.status == from => {
                p.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn link_voucher_if_unlinked(&self, id: Uuid, voucher_id: Uuid) -> Result<bool> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&id) {
            Some(p) if p.voucher_id.is_none() => {
                p.voucher_id = Some(voucher_id);
                p.status = PaymentStatus::Received;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryVoucherTypesStore {
    types: Arc<RwLock<HashMap<Uuid, VoucherType>>>,
}

impl InMemoryVoucherTypesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, voucher_type: VoucherType) {
        self.types
            .write()
            .await
            .insert(voucher_type.id, voucher_type);
    }
}

#[async_trait]
impl VoucherTypesStore for InMemoryVoucherTypesStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VoucherType>> {
        Ok(self.types.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<VoucherType>> {
        let mut all: Vec<VoucherType> = self.types.read().await.values().cloned().collect();
        all.sort_by_key(|t| t.value_cents);
        Ok(all)
    }
}

#[derive(Clone)]
pub struct InMemoryVouchersStore {
    vouchers: Arc<RwLock<HashMap<Uuid, Voucher>>>,
    types: InMemoryVoucherTypesStore,
}

impl InMemoryVouchersStore {
    pub fn new(types: InMemoryVoucherTypesStore) -> Self {
        Self {
            vouchers: Arc::new(RwLock::new(HashMap::new())),
            types,
        }
    }
}

#[async_trait]
impl VouchersStore for InMemoryVouchersStore {
    async fn insert(
        &self,
        code: &str,
        voucher_type_id: Uuid,
        user_id: Uuid,
        payment_id: Option<Uuid>,
    ) -> Result<InsertVoucherOutcome> {
        let mut vouchers = self.vouchers.write().await;

        if vouchers.values().any(|v| v.code == code) {
            return Ok(InsertVoucherOutcome::CodeCollision);
        }
        if let Some(pid) = payment_id {
            if vouchers.values().any(|v| v.payment_id == Some(pid)) {
                return Ok(InsertVoucherOutcome::PaymentAlreadyIssued);
            }
        }

        let voucher = Voucher {
            id: Uuid::new_v4(),
            code: code.to_string(),
            voucher_type_id,
            user_id,
            payment_id,
            status: VoucherStatus::Active,
            used_at: None,
            validated_by: None,
            created_at: Utc::now(),
        };
        vouchers.insert(voucher.id, voucher.clone());
        Ok(InsertVoucherOutcome::Inserted(voucher))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Voucher>> {
        Ok(self.vouchers.read().await.get(&id).cloned())
    }

    async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<Voucher>> {
        Ok(self
            .vouchers
            .read()
            .await
            .values()
            .find(|v| v.payment_id == Some(payment_id))
            .cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        Ok(self
            .vouchers
            .read()
            .await
            .values()
            .find(|v| v.code == code)
            .cloned())
    }

    async fn find_view_by_code(&self, code: &str) -> Result<Option<VoucherView>> {
        let Some(voucher) = self.find_by_code(code).await? else {
            return Ok(None);
        };
        let voucher_type = self
            .types
            .find_by_id(voucher.voucher_type_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("voucher {} has no type row", voucher.id))?;

        Ok(Some(VoucherView {
            id: voucher.id,
            code: voucher.code,
            status: voucher.status,
            used_at: voucher.used_at,
            voucher_type: VoucherTypeSummary {
                name: voucher_type.name,
                value_cents: voucher_type.value_cents,
                description: Some(voucher_type.description),
            },
        }))
    }

    async fn redeem_if_active(&self, code: &str, validator_id: Uuid) -> Result<Option<Voucher>> {
        let mut vouchers = self.vouchers.write().await;
        let Some(voucher) = vouchers
            .values_mut()
            .find(|v| v.code == code && v.status == VoucherStatus::Active)
        else {
            return Ok(None);
        };
        voucher.status = VoucherStatus::Used;
        voucher.used_at = Some(Utc::now());
        voucher.validated_by = Some(validator_id);
        Ok(Some(voucher.clone()))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Voucher>> {
        let mut all: Vec<Voucher> = self
            .vouchers
            .read()
            .await
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        all.sort_by_key(|v| std::cmp::Reverse(v.created_at));
        Ok(all)
    }
}
