use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::payment::PaymentStatus;

pub mod asaas;
pub mod mock;

/// A gateway call that did not produce a usable result. Non-2xx responses
/// carry the provider's message; callers treat any variant as fatal to the
/// current request (no retries).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Provider(String),
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    pub tax_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CustomerRef {
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct PixPaymentSpec {
    pub customer_id: String,
    pub value_cents: i64,
    pub description: String,
    pub external_reference: String,
}

#[derive(Debug, Clone)]
pub struct CardPaymentSpec {
    pub customer_id: String,
    pub value_cents: i64,
    pub description: String,
    pub external_reference: String,
    pub holder_name: String,
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub ccv: String,
    pub holder_info_name: String,
    pub holder_info_email: String,
    pub holder_info_tax_id: String,
    pub holder_info_postal_code: String,
    pub holder_info_address_number: String,
    pub holder_info_phone: String,
    pub remote_ip: String,
}

/// Payment state as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayPaymentStatus {
    Pending,
    Confirmed,
    Received,
    Overdue,
    Refunded,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl GatewayPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayPaymentStatus::Pending => "PENDING",
            GatewayPaymentStatus::Confirmed => "CONFIRMED",
            GatewayPaymentStatus::Received => "RECEIVED",
            GatewayPaymentStatus::Overdue => "OVERDUE",
            GatewayPaymentStatus::Refunded => "REFUNDED",
            GatewayPaymentStatus::Deleted => "DELETED",
            GatewayPaymentStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, GatewayPaymentStatus::Confirmed | GatewayPaymentStatus::Received)
    }

    pub fn is_dead(&self) -> bool {
        matches!(
            self,
            GatewayPaymentStatus::Overdue
                | GatewayPaymentStatus::Refunded
                | GatewayPaymentStatus::Deleted
        )
    }
}

#[derive(Debug, Clone)]
pub struct PaymentRef {
    pub id: String,
    pub status: GatewayPaymentStatus,
}

#[derive(Debug, Clone)]
pub struct PixQrCode {
    pub encoded_image: String,
    pub payload: String,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Push notification from the provider. Anything other than the two
/// confirmation events is acknowledged without side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookEventType {
    PaymentConfirmed,
    PaymentReceived,
    #[serde(other)]
    Other,
}

impl WebhookEventType {
    /// Local status a confirmation event maps to; `None` for events that
    /// are ignored.
    pub fn settled_status(&self) -> Option<PaymentStatus> {
        match self {
            WebhookEventType::PaymentConfirmed => Some(PaymentStatus::Confirmed),
            WebhookEventType::PaymentReceived => Some(PaymentStatus::Received),
            WebhookEventType::Other => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayment {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: WebhookEventType,
    pub payment: Option<WebhookPayment>,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_customer(&self, profile: &CustomerProfile) -> Result<CustomerRef, GatewayError>;

    async fn find_customer_by_tax_id(
        &self,
        tax_id: &str,
    ) -> Result<Option<CustomerRef>, GatewayError>;

    async fn create_pix_payment(&self, spec: &PixPaymentSpec) -> Result<PaymentRef, GatewayError>;

    /// Synchronous capture attempt; the returned status is final for the
    /// card flow.
    async fn create_credit_card_payment(
        &self,
        spec: &CardPaymentSpec,
    ) -> Result<PaymentRef, GatewayError>;

    async fn get_pix_qr_code(&self, payment_ref: &str) -> Result<PixQrCode, GatewayError>;

    async fn get_payment_status(
        &self,
        payment_ref: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError>;
}
