use std::sync::Arc;

use crate::codes::normalize_code;
use crate::domain::user::AuthUser;
use crate::domain::voucher::{Voucher, VoucherStatus, VoucherType, VoucherView};
use crate::error::ApiError;
use crate::repo::ports::{VouchersStore, VoucherTypesStore};

/// Looks vouchers up by code and performs single-use redemption.
#[derive(Clone)]
pub struct ValidationService {
    pub vouchers: Arc<dyn VouchersStore>,
    pub voucher_types: Arc<dyn VoucherTypesStore>,
}

impl ValidationService {
    pub async fn lookup(&self, code: &str) -> Result<VoucherView, ApiError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(ApiError::Validation("code is required".to_string()));
        }

        self.vouchers
            .find_view_by_code(&code)
            .await?
            .ok_or_else(|| ApiError::NotFound("voucher not found".to_string()))
    }

    /// The conditional update in the repo is the mutual exclusion: two
    /// simultaneous redemptions of one code cannot both succeed, the loser
    /// sees the row already `used` and gets a conflict with the original
    /// `used_at`.
    pub async fn redeem(
        &self,
        code: &str,
        validator: &AuthUser,
    ) -> Result<(Voucher, VoucherType), ApiError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(ApiError::Validation("code is required".to_string()));
        }

        if let Some(redeemed) = self.vouchers.redeem_if_active(&code, validator.id).await? {
            let voucher_type = self
                .voucher_types
                .find_by_id(redeemed.voucher_type_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("voucher {} has no type row", redeemed.id))?;
            tracing::info!(code = %redeemed.code, validator = %validator.login_id, "voucher redeemed");
            return Ok((redeemed, voucher_type));
        }

        match self.vouchers.find_by_code(&code).await? {
            None => Err(ApiError::NotFound("voucher not found".to_string())),
            Some(v) if v.status == VoucherStatus::Used => {
                Err(ApiError::VoucherAlreadyUsed { used_at: v.used_at })
            }
            // Active but the update missed it: a concurrent redeem slipped
            // in between the two queries.
            Some(v) => Err(ApiError::VoucherAlreadyUsed { used_at: v.used_at }),
        }
    }
}
