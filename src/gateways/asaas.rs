use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::gateways::{
    CardPaymentSpec, CustomerProfile, CustomerRef, GatewayError, GatewayPaymentStatus,
    PaymentGateway, PaymentRef, PixPaymentSpec, PixQrCode,
};

/// REST adapter for the Asaas payment provider. Amounts are stored locally
/// in cents; Asaas takes decimal reais on the wire.
pub struct AsaasGateway {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl AsaasGateway {
    async fn request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Value, GatewayError> {
        let resp = builder
            .header("access_token", &self.api_key)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or_default();

        if !status.is_success() {
            let message = body
                .pointer("/errors/0/description")
                .and_then(Value::as_str)
                .unwrap_or("payment provider rejected the request")
                .to_string();
            tracing::warn!(http_status = %status, %message, "asaas call failed");
            return Err(GatewayError::Provider(message));
        }

        Ok(body)
    }

    async fn get(&self, path: &str) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        self.request(self.client.get(url)).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        self.request(self.client.post(url).json(&body)).await
    }
}

fn cents_to_decimal(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn parse_status(body: &Value) -> GatewayPaymentStatus {
    body.get("status")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or(GatewayPaymentStatus::Unknown)
}

fn require_id(body: &Value) -> Result<String, GatewayError> {
    body.get("id")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| GatewayError::Provider("response missing payment id".to_string()))
}

#[async_trait::async_trait]
impl PaymentGateway for AsaasGateway {
    fn name(&self) -> &'static str {
        "asaas"
    }

    async fn create_customer(&self, profile: &CustomerProfile) -> Result<CustomerRef, GatewayError> {
        let body = self
            .post(
                "/customers",
                json!({
                    "name": profile.name,
                    "cpfCnpj": profile.tax_id,
                    "email": profile.email,
                }),
            )
            .await?;

        Ok(CustomerRef {
            id: require_id(&body)?,
        })
    }

    async fn find_customer_by_tax_id(
        &self,
        tax_id: &str,
    ) -> Result<Option<CustomerRef>, GatewayError> {
        let body = self
            .get(&format!("/customers?cpfCnpj={}", digits_only(tax_id)))
            .await?;

        Ok(body
            .pointer("/data/0/id")
            .and_then(Value::as_str)
            .map(|id| CustomerRef { id: id.to_string() }))
    }

    async fn create_pix_payment(&self, spec: &PixPaymentSpec) -> Result<PaymentRef, GatewayError> {
        let body = self
            .post(
                "/payments",
                json!({
                    "customer": spec.customer_id,
                    "billingType": "PIX",
                    "value": cents_to_decimal(spec.value_cents),
                    "description": spec.description,
                    "externalReference": spec.external_reference,
                    "dueDate": today(),
                }),
            )
            .await?;

        Ok(PaymentRef {
            id: require_id(&body)?,
            status: parse_status(&body),
        })
    }

    async fn create_credit_card_payment(
        &self,
        spec: &CardPaymentSpec,
    ) -> Result<PaymentRef, GatewayError> {
        let body = self
            .post(
                "/payments",
                json!({
                    "customer": spec.customer_id,
                    "billingType": "CREDIT_CARD",
                    "value": cents_to_decimal(spec.value_cents),
                    "description": spec.description,
                    "externalReference": spec.external_reference,
                    "dueDate": today(),
                    "creditCard": {
                        "holderName": spec.holder_name,
                        "number": spec.card_number,
                        "expiryMonth": spec.expiry_month,
                        "expiryYear": spec.expiry_year,
                        "ccv": spec.ccv,
                    },
                    "creditCardHolderInfo": {
                        "name": spec.holder_info_name,
                        "email": spec.holder_info_email,
                        "cpfCnpj": spec.holder_info_tax_id,
                        "postalCode": spec.holder_info_postal_code,
                        "addressNumber": spec.holder_info_address_number,
                        "phone": spec.holder_info_phone,
                    },
                    "remoteIp": spec.remote_ip,
                }),
            )
            .await?;

        Ok(PaymentRef {
            id: require_id(&body)?,
            status: parse_status(&body),
        })
    }

    async fn get_pix_qr_code(&self, payment_ref: &str) -> Result<PixQrCode, GatewayError> {
        let body = self
            .get(&format!("/payments/{payment_ref}/pixQrCode"))
            .await?;

        let encoded_image = body
            .get("encodedImage")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Provider("pix qr code missing image".to_string()))?
            .to_string();
        let payload = body
            .get("payload")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Provider("pix qr code missing payload".to_string()))?
            .to_string();
        let expiration_date = body
            .get("expirationDate")
            .and_then(Value::as_str)
            .and_then(parse_expiration);

        Ok(PixQrCode {
            encoded_image,
            payload,
            expiration_date,
        })
    }

    async fn get_payment_status(
        &self,
        payment_ref: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError> {
        let body = self.get(&format!("/payments/{payment_ref}")).await?;
        Ok(parse_status(&body))
    }
}

// Asaas emits "YYYY-MM-DD HH:MM:SS" rather than RFC 3339.
fn parse_expiration(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}
