use crate::domain::payment::PaymentStatus;

/// A status change rejected by the transition table. The payment row is left
/// untouched when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
}

impl std::fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "illegal payment transition {} -> {}",
            self.from.as_str(),
            self.to.as_str()
        )
    }
}

impl std::error::Error for IllegalTransition {}

pub fn is_legal(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    matches!(
        (from, to),
        // PIX: artifacts stored, payer has the QR code
        (Pending, AwaitingPayment)
            // card capture is synchronous, skips AwaitingPayment
            | (Pending, Confirmed)
            | (Pending, Failed)
            | (AwaitingPayment, Confirmed)
            | (AwaitingPayment, Received)
            | (AwaitingPayment, Failed)
            // issuance marks a confirmed payment received
            | (Confirmed, Received)
    )
}

/// Validates and applies one transition, rejecting anything outside the
/// table (a webhook confirming an already-FAILED payment, a second terminal
/// success, and so on).
pub fn apply_transition(
    from: PaymentStatus,
    to: PaymentStatus,
) -> Result<PaymentStatus, IllegalTransition> {
    if is_legal(from, to) {
        Ok(to)
    } else {
        Err(IllegalTransition { from, to })
    }
}
