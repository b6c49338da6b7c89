use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::codes::{generate_voucher_code, MAX_CODE_ATTEMPTS};
use crate::error::ApiError;
use crate::repo::ports::{InsertVoucherOutcome, PaymentsStore, VouchersStore};

#[derive(Debug, Clone, Serialize)]
pub struct IssuedVoucher {
    pub id: Uuid,
    pub code: String,
}

/// Creates vouchers. For payments, the UNIQUE constraint on
/// `vouchers.payment_id` is the arbiter: whichever of the poll and webhook
/// paths inserts first wins, the loser observes `PaymentAlreadyIssued` and
/// returns the existing voucher.
#[derive(Clone)]
pub struct IssuanceService {
    pub payments: Arc<dyn PaymentsStore>,
    pub vouchers: Arc<dyn VouchersStore>,
}

impl IssuanceService {
    pub async fn issue_for_payment(
        &self,
        payment_id: Uuid,
        user_id: Uuid,
        voucher_type_id: Uuid,
    ) -> Result<IssuedVoucher, ApiError> {
        if let Some(existing) = self.vouchers.find_by_payment(payment_id).await? {
            return Ok(IssuedVoucher {
                id: existing.id,
                code: existing.code,
            });
        }

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_voucher_code();
            match self
                .vouchers
                .insert(&code, voucher_type_id, user_id, Some(payment_id))
                .await?
            {
                InsertVoucherOutcome::Inserted(voucher) => {
                    let linked = self
                        .payments
                        .link_voucher_if_unlinked(payment_id, voucher.id)
                        .await?;
                    if !linked {
                        // Our insert won the payment_id constraint, so the
                        // link slot can only be occupied after a partial
                        // earlier run. Keep the voucher, flag for follow-up.
                        tracing::warn!(
                            payment_id = %payment_id,
                            voucher_id = %voucher.id,
                            "voucher inserted but payment already linked"
                        );
                    }
                    tracing::info!(payment_id = %payment_id, voucher_id = %voucher.id, "voucher issued");
                    return Ok(IssuedVoucher {
                        id: voucher.id,
                        code: voucher.code,
                    });
                }
                InsertVoucherOutcome::CodeCollision => continue,
                InsertVoucherOutcome::PaymentAlreadyIssued => {
                    let existing = self
                        .vouchers
                        .find_by_payment(payment_id)
                        .await?
                        .ok_or_else(|| {
                            anyhow::anyhow!("voucher for payment {payment_id} vanished after conflict")
                        })?;
                    return Ok(IssuedVoucher {
                        id: existing.id,
                        code: existing.code,
                    });
                }
            }
        }

        Err(ApiError::CodeGenerationExhausted)
    }

    /// No-payment issuance path: same bounded-retry code generation, no
    /// payment linkage.
    pub async fn issue_direct(
        &self,
        user_id: Uuid,
        voucher_type_id: Uuid,
    ) -> Result<IssuedVoucher, ApiError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_voucher_code();
            match self
                .vouchers
                .insert(&code, voucher_type_id, user_id, None)
                .await?
            {
                InsertVoucherOutcome::Inserted(voucher) => {
                    return Ok(IssuedVoucher {
                        id: voucher.id,
                        code: voucher.code,
                    });
                }
                InsertVoucherOutcome::CodeCollision => continue,
                InsertVoucherOutcome::PaymentAlreadyIssued => {
                    return Err(ApiError::Internal(anyhow::anyhow!(
                        "payment constraint hit on a paymentless insert"
                    )));
                }
            }
        }

        Err(ApiError::CodeGenerationExhausted)
    }
}
