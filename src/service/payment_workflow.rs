use std::sync::Arc;

use uuid::Uuid;

use crate::domain::payment::{
    BillingMethod, InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatus,
    PaymentStatusResponse, PixArtifacts,
};
use crate::domain::transitions;
use crate::domain::user::AuthUser;
use crate::error::ApiError;
use crate::gateways::{
    CardPaymentSpec, CustomerProfile, CustomerRef, GatewayPaymentStatus, PaymentGateway,
    PixPaymentSpec, WebhookEvent,
};
use crate::repo::ports::{PaymentsStore, VouchersStore, VoucherTypesStore};
use crate::service::issuance::IssuanceService;

/// What a status poll should do after hearing back from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Settled upstream: issue the voucher.
    Issue(PaymentStatus),
    /// Dead upstream: mark the payment failed.
    Fail,
    /// Nothing new, caller polls again.
    Unchanged,
}

pub fn poll_action(status: GatewayPaymentStatus) -> PollAction {
    match status {
        GatewayPaymentStatus::Confirmed => PollAction::Issue(PaymentStatus::Confirmed),
        GatewayPaymentStatus::Received => PollAction::Issue(PaymentStatus::Received),
        s if s.is_dead() => PollAction::Fail,
        _ => PollAction::Unchanged,
    }
}

/// Result of one webhook delivery, after the always-200 contract is
/// applied at the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Ignored,
    UnknownPayment,
    AlreadyProcessed,
    Rejected,
    Issued,
}

/// Drives a payment from creation through confirmation. Confirmation can
/// arrive via the client's status poll or the gateway's webhook; both funnel
/// through `IssuanceService`, which guarantees at most one voucher per
/// payment.
#[derive(Clone)]
pub struct PaymentWorkflow {
    pub payments: Arc<dyn PaymentsStore>,
    pub vouchers: Arc<dyn VouchersStore>,
    pub voucher_types: Arc<dyn VoucherTypesStore>,
    pub issuance: IssuanceService,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl PaymentWorkflow {
    pub async fn initiate(
        &self,
        user: &AuthUser,
        req: InitiatePaymentRequest,
        remote_ip: String,
    ) -> Result<InitiatePaymentResponse, ApiError> {
        let tax_id: String = req.tax_id.chars().filter(|c| c.is_ascii_digit()).collect();
        if tax_id.is_empty() {
            return Err(ApiError::Validation("tax_id is required".to_string()));
        }

        let voucher_type = self
            .voucher_types
            .find_by_id(req.voucher_type_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("voucher type not found".to_string()))?;

        let customer = self.resolve_customer(user, &req, &tax_id).await?;

        let payment_id = self
            .payments
            .insert_pending(
                user.id,
                voucher_type.id,
                req.billing_method,
                voucher_type.value_cents,
                &customer.id,
            )
            .await?;

        let description = format!("Voucher - {}", voucher_type.name);

        match req.billing_method {
            BillingMethod::Pix => {
                self.initiate_pix(payment_id, &customer.id, voucher_type.value_cents, description)
                    .await
            }
            BillingMethod::CreditCard => {
                self.initiate_card(
                    payment_id,
                    user,
                    req,
                    &customer.id,
                    &tax_id,
                    voucher_type.value_cents,
                    description,
                    remote_ip,
                )
                .await
            }
        }
    }

    async fn resolve_customer(
        &self,
        user: &AuthUser,
        req: &InitiatePaymentRequest,
        tax_id: &str,
    ) -> Result<CustomerRef, ApiError> {
        if let Some(found) = self.gateway.find_customer_by_tax_id(tax_id).await? {
            return Ok(found);
        }
        let profile = CustomerProfile {
            name: req.name.clone().unwrap_or_else(|| user.name.clone()),
            tax_id: tax_id.to_string(),
            email: req.email.clone().or_else(|| Some(user.email.clone())),
        };
        Ok(self.gateway.create_customer(&profile).await?)
    }

    async fn initiate_pix(
        &self,
        payment_id: Uuid,
        customer_id: &str,
        value_cents: i64,
        description: String,
    ) -> Result<InitiatePaymentResponse, ApiError> {
        let gateway_payment = self
            .gateway
            .create_pix_payment(&PixPaymentSpec {
                customer_id: customer_id.to_string(),
                value_cents,
                description,
                external_reference: payment_id.to_string(),
            })
            .await?;

        let qr = self.gateway.get_pix_qr_code(&gateway_payment.id).await?;

        self.payments
            .store_pix_artifacts(
                payment_id,
                &gateway_payment.id,
                &qr.encoded_image,
                &qr.payload,
                qr.expiration_date,
            )
            .await?;

        tracing::info!(%payment_id, gateway_payment_id = %gateway_payment.id, "pix payment awaiting");

        Ok(InitiatePaymentResponse::Pix {
            payment_id,
            status: PaymentStatus::AwaitingPayment,
            pix: PixArtifacts {
                encoded_image: qr.encoded_image,
                payload: qr.payload,
                expiration_date: qr.expiration_date,
            },
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn initiate_card(
        &self,
        payment_id: Uuid,
        user: &AuthUser,
        req: InitiatePaymentRequest,
        customer_id: &str,
        tax_id: &str,
        value_cents: i64,
        description: String,
        remote_ip: String,
    ) -> Result<InitiatePaymentResponse, ApiError> {
        let card = req
            .credit_card
            .ok_or_else(|| ApiError::Validation("credit_card is required".to_string()))?;
        let holder = req
            .credit_card_holder_info
            .ok_or_else(|| ApiError::Validation("credit_card_holder_info is required".to_string()))?;

        let gateway_payment = self
            .gateway
            .create_credit_card_payment(&CardPaymentSpec {
                customer_id: customer_id.to_string(),
                value_cents,
                description,
                external_reference: payment_id.to_string(),
                holder_name: card.holder_name,
                card_number: card.number,
                expiry_month: card.expiry_month,
                expiry_year: card.expiry_year,
                ccv: card.ccv,
                holder_info_name: holder.name,
                holder_info_email: holder.email,
                holder_info_tax_id: if holder.tax_id.is_empty() {
                    tax_id.to_string()
                } else {
                    holder.tax_id
                },
                holder_info_postal_code: holder.postal_code,
                holder_info_address_number: holder.address_number,
                holder_info_phone: holder.phone,
                remote_ip,
            })
            .await?;

        // Card capture is synchronous: the gateway's answer is final.
        if gateway_payment.status.is_settled() {
            self.payments
                .store_card_result(payment_id, &gateway_payment.id, PaymentStatus::Confirmed)
                .await?;

            let voucher = self
                .issuance
                .issue_for_payment(payment_id, user.id, req.voucher_type_id)
                .await?;

            Ok(InitiatePaymentResponse::Card {
                payment_id,
                status: PaymentStatus::Confirmed,
                voucher_code: voucher.code,
            })
        } else {
            self.payments
                .store_card_result(payment_id, &gateway_payment.id, PaymentStatus::Failed)
                .await?;

            Err(ApiError::PaymentDeclined {
                gateway_status: gateway_payment.status.as_str().to_string(),
            })
        }
    }

    /// Client poll path. Once the payment is terminal-success and linked,
    /// the answer is served from the local row without contacting the
    /// gateway again.
    pub async fn check_status(
        &self,
        payment_id: Uuid,
        user: &AuthUser,
    ) -> Result<PaymentStatusResponse, ApiError> {
        let payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .filter(|p| p.user_id == user.id)
            .ok_or_else(|| ApiError::NotFound("payment not found".to_string()))?;

        if payment.status.is_terminal_success() {
            if let Some(voucher_id) = payment.voucher_id {
                let voucher = self.vouchers.find_by_id(voucher_id).await?;
                return Ok(PaymentStatusResponse {
                    status: payment.status,
                    voucher_code: voucher.map(|v| v.code),
                });
            }
        }

        if payment.status == PaymentStatus::AwaitingPayment {
            if let Some(gateway_payment_id) = payment.gateway_payment_id.as_deref() {
                let remote = self.gateway.get_payment_status(gateway_payment_id).await?;

                match poll_action(remote) {
                    PollAction::Issue(settled) => {
                        // CAS keeps a concurrent webhook from double-applying;
                        // issuance is idempotent either way.
                        self.payments
                            .transition_status(payment.id, PaymentStatus::AwaitingPayment, settled)
                            .await?;

                        let voucher = self
                            .issuance
                            .issue_for_payment(payment.id, payment.user_id, payment.voucher_type_id)
                            .await?;

                        return Ok(PaymentStatusResponse {
                            status: PaymentStatus::Received,
                            voucher_code: Some(voucher.code),
                        });
                    }
                    PollAction::Fail => {
                        self.payments
                            .transition_status(
                                payment.id,
                                PaymentStatus::AwaitingPayment,
                                PaymentStatus::Failed,
                            )
                            .await?;

                        return Ok(PaymentStatusResponse {
                            status: PaymentStatus::Failed,
                            voucher_code: None,
                        });
                    }
                    PollAction::Unchanged => {}
                }
            }
        }

        Ok(PaymentStatusResponse {
            status: payment.status,
            voucher_code: None,
        })
    }

    /// Gateway push path. Callers must acknowledge the gateway regardless of
    /// what this returns; errors here are recorded, never surfaced.
    pub async fn handle_webhook(&self, event: &WebhookEvent) -> anyhow::Result<WebhookOutcome> {
        let Some(settled) = event.event.settled_status() else {
            return Ok(WebhookOutcome::Ignored);
        };
        let Some(gateway_payment) = event.payment.as_ref() else {
            return Ok(WebhookOutcome::Ignored);
        };

        let Some(payment) = self
            .payments
            .find_by_gateway_id(&gateway_payment.id)
            .await?
        else {
            tracing::warn!(gateway_payment_id = %gateway_payment.id, "webhook for unknown payment");
            return Ok(WebhookOutcome::UnknownPayment);
        };

        // Duplicate or out-of-order delivery: acknowledge without touching
        // the row.
        if payment.status.is_terminal() || payment.voucher_id.is_some() {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        if let Err(illegal) = transitions::apply_transition(payment.status, settled) {
            tracing::warn!(payment_id = %payment.id, %illegal, "webhook transition rejected");
            return Ok(WebhookOutcome::Rejected);
        }

        let moved = self
            .payments
            .transition_status(payment.id, payment.status, settled)
            .await?;
        if !moved {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        self.issuance
            .issue_for_payment(payment.id, payment.user_id, payment.voucher_type_id)
            .await
            .map_err(anyhow::Error::from)?;

        tracing::info!(payment_id = %payment.id, event = ?event.event, "webhook settled payment");
        Ok(WebhookOutcome::Issued)
    }
}
