use std::sync::Arc;

use uuid::Uuid;
use vouchers_api::domain::payment::{
    BillingMethod, CardDetails, CardHolderInfo, InitiatePaymentRequest, InitiatePaymentResponse,
    PaymentStatus,
};
use vouchers_api::domain::user::{AuthUser, Role};
use vouchers_api::domain::voucher::{VoucherStatus, VoucherType};
use vouchers_api::error::ApiError;
use vouchers_api::gateways::mock::MockGateway;
use vouchers_api::gateways::{GatewayPaymentStatus, WebhookEvent, WebhookEventType, WebhookPayment};
use vouchers_api::repo::in_memory::{
    InMemoryPaymentsStore, InMemoryVouchersStore, InMemoryVoucherTypesStore,
};
use vouchers_api::repo::ports::{PaymentsStore, VouchersStore, VoucherTypesStore};
use vouchers_api::service::issuance::IssuanceService;
use vouchers_api::service::payment_workflow::{PaymentWorkflow, WebhookOutcome};
use vouchers_api::service::validation::ValidationService;

struct Harness {
    workflow: PaymentWorkflow,
    issuance: IssuanceService,
    validation: ValidationService,
    payments: Arc<dyn PaymentsStore>,
    vouchers: Arc<dyn VouchersStore>,
    gateway: Arc<MockGateway>,
    voucher_type_id: Uuid,
}

async fn harness(behavior: &str) -> Harness {
    let types_store = InMemoryVoucherTypesStore::new();
    let voucher_type_id = Uuid::new_v4();
    types_store
        .put(VoucherType {
            id: voucher_type_id,
            name: "Day pass".to_string(),
            description: "One day of access".to_string(),
            value_cents: 5000,
            image_url: None,
        })
        .await;

    let payments: Arc<dyn PaymentsStore> = Arc::new(InMemoryPaymentsStore::new());
    let vouchers: Arc<dyn VouchersStore> =
        Arc::new(InMemoryVouchersStore::new(types_store.clone()));
    let voucher_types: Arc<dyn VoucherTypesStore> = Arc::new(types_store);
    let gateway = Arc::new(MockGateway::new(behavior));

    let issuance = IssuanceService {
        payments: payments.clone(),
        vouchers: vouchers.clone(),
    };
    let workflow = PaymentWorkflow {
        payments: payments.clone(),
        vouchers: vouchers.clone(),
        voucher_types: voucher_types.clone(),
        issuance: issuance.clone(),
        gateway: gateway.clone(),
    };
    let validation = ValidationService {
        vouchers: vouchers.clone(),
        voucher_types,
    };

    Harness {
        workflow,
        issuance,
        validation,
        payments,
        vouchers,
        gateway,
        voucher_type_id,
    }
}

fn customer() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        login_id: "AB23CD".to_string(),
        name: "Maria Silva".to_string(),
        email: "maria@example.com".to_string(),
        role: Role::Customer,
    }
}

fn validator() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        login_id: "XY45ZW".to_string(),
        name: "Front Desk".to_string(),
        email: "desk@example.com".to_string(),
        role: Role::Validator,
    }
}

fn pix_request(voucher_type_id: Uuid) -> InitiatePaymentRequest {
    InitiatePaymentRequest {
        voucher_type_id,
        billing_method: BillingMethod::Pix,
        tax_id: "123.456.789-09".to_string(),
        name: None,
        email: None,
        credit_card: None,
        credit_card_holder_info: None,
    }
}

fn card_request(voucher_type_id: Uuid) -> InitiatePaymentRequest {
    InitiatePaymentRequest {
        voucher_type_id,
        billing_method: BillingMethod::CreditCard,
        tax_id: "12345678909".to_string(),
        name: None,
        email: None,
        credit_card: Some(CardDetails {
            holder_name: "MARIA SILVA".to_string(),
            number: "5162306219378829".to_string(),
            expiry_month: "05".to_string(),
            expiry_year: "2030".to_string(),
            ccv: "318".to_string(),
        }),
        credit_card_holder_info: Some(CardHolderInfo {
            name: "Maria Silva".to_string(),
            email: "maria@example.com".to_string(),
            tax_id: "12345678909".to_string(),
            postal_code: "01310-000".to_string(),
            address_number: "150".to_string(),
            phone: "11999990000".to_string(),
        }),
    }
}

fn received_event(gateway_payment_id: &str) -> WebhookEvent {
    WebhookEvent {
        event: WebhookEventType::PaymentReceived,
        payment: Some(WebhookPayment {
            id: gateway_payment_id.to_string(),
        }),
    }
}

async fn initiate_pix(h: &Harness, user: &AuthUser) -> (Uuid, String) {
    let resp = h
        .workflow
        .initiate(user, pix_request(h.voucher_type_id), "127.0.0.1".to_string())
        .await
        .unwrap();
    let payment_id = match resp {
        InitiatePaymentResponse::Pix {
            payment_id,
            status,
            pix,
        } => {
            assert_eq!(status, PaymentStatus::AwaitingPayment);
            assert!(!pix.payload.is_empty());
            assert!(!pix.encoded_image.is_empty());
            payment_id
        }
        other => panic!("expected a pix response, got {other:?}"),
    };
    let payment = h.payments.find_by_id(payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::AwaitingPayment);
    let gateway_id = payment.gateway_payment_id.unwrap();
    (payment_id, gateway_id)
}

#[tokio::test]
async fn pix_purchase_settled_by_webhook_issues_one_voucher() {
    let h = harness("").await;
    let user = customer();
    let (payment_id, gateway_id) = initiate_pix(&h, &user).await;

    let outcome = h
        .workflow
        .handle_webhook(&received_event(&gateway_id))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Issued);

    let payment = h.payments.find_by_id(payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Received);
    let voucher = h.vouchers.find_by_payment(payment_id).await.unwrap().unwrap();
    assert_eq!(payment.voucher_id, Some(voucher.id));
    assert_eq!(voucher.status, VoucherStatus::Active);
    assert_eq!(voucher.user_id, user.id);

    // Gateways redeliver; a duplicate must not mint a second voucher.
    let replay = h
        .workflow
        .handle_webhook(&received_event(&gateway_id))
        .await
        .unwrap();
    assert_eq!(replay, WebhookOutcome::AlreadyProcessed);
    let again = h.vouchers.find_by_payment(payment_id).await.unwrap().unwrap();
    assert_eq!(again.id, voucher.id);
}

#[tokio::test]
async fn poll_and_webhook_converge_on_the_same_voucher() {
    let h = harness("").await;
    let user = customer();
    let (payment_id, gateway_id) = initiate_pix(&h, &user).await;

    h.gateway.settle(GatewayPaymentStatus::Confirmed);

    let polled = h.workflow.check_status(payment_id, &user).await.unwrap();
    assert_eq!(polled.status, PaymentStatus::Received);
    let code = polled.voucher_code.expect("poll should return the code");

    let outcome = h
        .workflow
        .handle_webhook(&WebhookEvent {
            event: WebhookEventType::PaymentConfirmed,
            payment: Some(WebhookPayment { id: gateway_id }),
        })
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);

    let voucher = h.vouchers.find_by_payment(payment_id).await.unwrap().unwrap();
    assert_eq!(voucher.code, code);
}

#[tokio::test]
async fn settled_poll_is_answered_from_the_local_row() {
    let h = harness("").await;
    let user = customer();
    let (payment_id, _) = initiate_pix(&h, &user).await;

    h.gateway.settle(GatewayPaymentStatus::Received);
    let first = h.workflow.check_status(payment_id, &user).await.unwrap();
    let code = first.voucher_code.unwrap();
    let polls_after_settle = h.gateway.status_calls();

    let second = h.workflow.check_status(payment_id, &user).await.unwrap();
    assert_eq!(second.status, PaymentStatus::Received);
    assert_eq!(second.voucher_code, Some(code));
    assert_eq!(h.gateway.status_calls(), polls_after_settle);
}

#[tokio::test]
async fn overdue_payment_fails_and_stays_failed() {
    let h = harness("").await;
    let user = customer();
    let (payment_id, gateway_id) = initiate_pix(&h, &user).await;

    h.gateway.settle(GatewayPaymentStatus::Overdue);
    let polled = h.workflow.check_status(payment_id, &user).await.unwrap();
    assert_eq!(polled.status, PaymentStatus::Failed);
    assert_eq!(polled.voucher_code, None);

    // A late confirmation cannot revive a dead payment.
    let outcome = h
        .workflow
        .handle_webhook(&received_event(&gateway_id))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
    assert!(h.vouchers.find_by_payment(payment_id).await.unwrap().is_none());
}

#[tokio::test]
async fn declined_card_leaves_a_failed_payment_and_no_voucher() {
    let h = harness("DECLINE_CARD").await;
    let user = customer();

    let err = h
        .workflow
        .initiate(&user, card_request(h.voucher_type_id), "127.0.0.1".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PaymentDeclined { .. }));

    let payment = h
        .payments
        .find_by_gateway_id("pay_mock_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(h.vouchers.find_by_payment(payment.id).await.unwrap().is_none());
}

#[tokio::test]
async fn confirmed_card_issues_the_voucher_synchronously() {
    let h = harness("").await;
    let user = customer();

    let resp = h
        .workflow
        .initiate(&user, card_request(h.voucher_type_id), "127.0.0.1".to_string())
        .await
        .unwrap();
    let (payment_id, code) = match resp {
        InitiatePaymentResponse::Card {
            payment_id,
            status,
            voucher_code,
        } => {
            assert_eq!(status, PaymentStatus::Confirmed);
            (payment_id, voucher_code)
        }
        other => panic!("expected a card response, got {other:?}"),
    };

    let voucher = h.vouchers.find_by_payment(payment_id).await.unwrap().unwrap();
    assert_eq!(voucher.code, code);
    let payment = h.payments.find_by_id(payment_id).await.unwrap().unwrap();
    assert_eq!(payment.voucher_id, Some(voucher.id));
}

#[tokio::test]
async fn issuance_is_idempotent_per_payment() {
    let h = harness("").await;
    let user = customer();
    let (payment_id, _) = initiate_pix(&h, &user).await;

    let first = h
        .issuance
        .issue_for_payment(payment_id, user.id, h.voucher_type_id)
        .await
        .unwrap();
    let second = h
        .issuance
        .issue_for_payment(payment_id, user.id, h.voucher_type_id)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.code, second.code);
    assert_eq!(h.vouchers.list_by_user(user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn redemption_is_single_use_with_the_original_timestamp() {
    let h = harness("").await;
    let user = customer();
    let issued = h
        .issuance
        .issue_direct(user.id, h.voucher_type_id)
        .await
        .unwrap();

    let staff = validator();
    let (redeemed, voucher_type) = h.validation.redeem(&issued.code, &staff).await.unwrap();
    assert_eq!(redeemed.status, VoucherStatus::Used);
    assert_eq!(redeemed.validated_by, Some(staff.id));
    assert_eq!(voucher_type.value_cents, 5000);
    let first_used_at = redeemed.used_at.unwrap();

    let err = h.validation.redeem(&issued.code, &staff).await.unwrap_err();
    match err {
        ApiError::VoucherAlreadyUsed { used_at } => {
            assert_eq!(used_at, Some(first_used_at));
        }
        other => panic!("expected already-used conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_codes_are_not_found() {
    let h = harness("").await;
    let staff = validator();

    let err = h.validation.lookup("NO SUCH").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = h.validation.redeem("NOSUCHCODE", &staff).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn webhooks_for_unknown_payments_and_other_events_are_acknowledged() {
    let h = harness("").await;

    let unknown = h
        .workflow
        .handle_webhook(&received_event("pay_mock_999"))
        .await
        .unwrap();
    assert_eq!(unknown, WebhookOutcome::UnknownPayment);

    let ignored = h
        .workflow
        .handle_webhook(&WebhookEvent {
            event: WebhookEventType::Other,
            payment: Some(WebhookPayment {
                id: "pay_mock_999".to_string(),
            }),
        })
        .await
        .unwrap();
    assert_eq!(ignored, WebhookOutcome::Ignored);
}

#[tokio::test]
async fn purchases_of_unknown_voucher_types_are_rejected() {
    let h = harness("").await;
    let user = customer();

    let err = h
        .workflow
        .initiate(&user, pix_request(Uuid::new_v4()), "127.0.0.1".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
