use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::gateways::{
    CardPaymentSpec, CustomerProfile, CustomerRef, GatewayError, GatewayPaymentStatus,
    PaymentGateway, PaymentRef, PixPaymentSpec, PixQrCode,
};

/// In-process stand-in for the provider, used by the workflow tests.
/// `behavior` mirrors the provider outcomes: "CONFIRM_CARD", "DECLINE_CARD",
/// anything else leaves PIX payments pending until `settle` is called.
pub struct MockGateway {
    pub behavior: String,
    counter: AtomicU64,
    status: Mutex<GatewayPaymentStatus>,
    status_calls: AtomicU64,
}

impl MockGateway {
    pub fn new(behavior: &str) -> Self {
        Self {
            behavior: behavior.to_string(),
            counter: AtomicU64::new(0),
            status: Mutex::new(GatewayPaymentStatus::Pending),
            status_calls: AtomicU64::new(0),
        }
    }

    /// Simulates the payer completing a PIX charge.
    pub fn settle(&self, status: GatewayPaymentStatus) {
        *self.status.lock().unwrap() = status;
    }

    /// How many times `get_payment_status` has been called.
    pub fn status_calls(&self) -> u64 {
        self.status_calls.load(Ordering::Relaxed)
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}_{n}")
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_customer(
        &self,
        _profile: &CustomerProfile,
    ) -> Result<CustomerRef, GatewayError> {
        Ok(CustomerRef {
            id: self.next_id("cus_mock"),
        })
    }

    async fn find_customer_by_tax_id(
        &self,
        _tax_id: &str,
    ) -> Result<Option<CustomerRef>, GatewayError> {
        Ok(None)
    }

    async fn create_pix_payment(&self, _spec: &PixPaymentSpec) -> Result<PaymentRef, GatewayError> {
        Ok(PaymentRef {
            id: self.next_id("pay_mock"),
            status: GatewayPaymentStatus::Pending,
        })
    }

    async fn create_credit_card_payment(
        &self,
        _spec: &CardPaymentSpec,
    ) -> Result<PaymentRef, GatewayError> {
        let status = if self.behavior == "DECLINE_CARD" {
            GatewayPaymentStatus::Unknown
        } else {
            GatewayPaymentStatus::Confirmed
        };
        Ok(PaymentRef {
            id: self.next_id("pay_mock"),
            status,
        })
    }

    async fn get_pix_qr_code(&self, _payment_ref: &str) -> Result<PixQrCode, GatewayError> {
        Ok(PixQrCode {
            encoded_image: "bW9jaw==".to_string(),
            payload: "00020126mockpixpayload".to_string(),
            expiration_date: None,
        })
    }

    async fn get_payment_status(
        &self,
        _payment_ref: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError> {
        self.status_calls.fetch_add(1, Ordering::Relaxed);
        Ok(*self.status.lock().unwrap())
    }
}
