use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMethod {
    Pix,
    CreditCard,
}

impl BillingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMethod::Pix => "PIX",
            BillingMethod::CreditCard => "CREDIT_CARD",
        }
    }

    pub fn parse(s: &str) -> Option<BillingMethod> {
        match s {
            "PIX" => Some(BillingMethod::Pix),
            "CREDIT_CARD" => Some(BillingMethod::CreditCard),
            _ => None,
        }
    }
}

/// Local payment lifecycle. `Received` and `Failed` are terminal; legality
/// of every change is checked against the table in `domain::transitions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    AwaitingPayment,
    Confirmed,
    Received,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::AwaitingPayment => "AWAITING_PAYMENT",
            PaymentStatus::Confirmed => "CONFIRMED",
            PaymentStatus::Received => "RECEIVED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "AWAITING_PAYMENT" => Some(PaymentStatus::AwaitingPayment),
            "CONFIRMED" => Some(PaymentStatus::Confirmed),
            "RECEIVED" => Some(PaymentStatus::Received),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal_success(&self) -> bool {
        matches!(self, PaymentStatus::Confirmed | PaymentStatus::Received)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Received | PaymentStatus::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub voucher_type_id: Uuid,
    pub billing_method: BillingMethod,
    pub value_cents: i64,
    pub status: PaymentStatus,
    pub gateway_customer_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub pix_encoded_image: Option<String>,
    pub pix_payload: Option<String>,
    pub pix_expiration: Option<DateTime<Utc>>,
    pub voucher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub holder_name: String,
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub ccv: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardHolderInfo {
    pub name: String,
    pub email: String,
    pub tax_id: String,
    pub postal_code: String,
    pub address_number: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentRequest {
    pub voucher_type_id: Uuid,
    pub billing_method: BillingMethod,
    pub tax_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub credit_card: Option<CardDetails>,
    pub credit_card_holder_info: Option<CardHolderInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PixArtifacts {
    pub encoded_image: String,
    pub payload: String,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// What `POST /payments` hands back: PIX purchases get the QR artifacts to
/// display, card purchases are captured synchronously and return the code.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InitiatePaymentResponse {
    Pix {
        payment_id: Uuid,
        status: PaymentStatus,
        pix: PixArtifacts,
    },
    Card {
        payment_id: Uuid,
        status: PaymentStatus,
        voucher_code: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusResponse {
    pub status: PaymentStatus,
    pub voucher_code: Option<String>,
}
