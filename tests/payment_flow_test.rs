use hostel_payments::cache::PaymentCache;
use hostel_payments::config::{ApiConfig, GatewayConfig, PaymentsConfig};
use hostel_payments::payments::backend::HttpPaymentsBackend;
use hostel_payments::payments::confirmers::{ChannelCheckoutWidget, PendingCheckout};
use hostel_payments::payments::error::{PaymentError, ORDER_CREATION_FALLBACK};
use hostel_payments::payments::registry::MethodRegistry;
use hostel_payments::payments::types::{
    CardDetails, ConfirmationProtocol, FormData, PaymentIntent, PaymentKind, PaymentMethod,
    PaymentStatus, VerificationPayload, VerificationProof,
};
use hostel_payments::payments::verifier::Verifier;
use hostel_payments::services::{FlowState, PaymentOrchestrator};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

fn api_config(url: String) -> ApiConfig {
    ApiConfig {
        base_url: url,
        auth_token: Some("student-token".to_string()),
        order_timeout_secs: 5,
        verify_timeout_secs: 5,
        list_timeout_secs: 5,
    }
}

fn orchestrator(url: String) -> (PaymentOrchestrator, UnboundedReceiver<PendingCheckout>) {
    let backend = Arc::new(HttpPaymentsBackend::from_config(&api_config(url)).expect("client"));
    let (widget, checkouts) = ChannelCheckoutWidget::new();
    let payments = PaymentsConfig {
        simulation_mode: true,
        settlement_delay_ms: 10,
        ..PaymentsConfig::default()
    };
    let registry =
        MethodRegistry::with_defaults(&payments, &GatewayConfig::default(), Arc::new(widget));
    (
        PaymentOrchestrator::new(Arc::new(registry), backend, PaymentCache::new()),
        checkouts,
    )
}

fn card_form(number: &str) -> FormData {
    FormData::Card(CardDetails {
        number: number.to_string(),
        expiry: "12/29".to_string(),
        cvv: "123".to_string(),
        holder_name: "Asha Rao".to_string(),
    })
}

#[tokio::test]
async fn card_payment_succeeds_end_to_end() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/payments/create-order")
        .match_header("authorization", "Bearer student-token")
        .match_body(Matcher::Json(json!({
            "targetId": "B1",
            "amount": 5000,
            "paymentKind": "advance",
            "paymentMethod": "card"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"data":{"paymentId":"P1","amount":5000,"currency":"INR"}}"#)
        .expect(1)
        .create_async()
        .await;
    let verify = server
        .mock("POST", "/payments/verify")
        .match_body(Matcher::Json(json!({
            "paymentId": "P1",
            "method": "card",
            "cardNumber": "4111111111111111",
            "cardExpiry": "12/29",
            "cardCvv": "123"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"success":true,"data":{"id":"P1","amount":5000,"status":"completed","method":"card"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let (orchestrator, _checkouts) = orchestrator(server.url());
    let record = orchestrator
        .pay(
            PaymentIntent::new("B1", 5000, PaymentKind::Advance, PaymentMethod::Card),
            &card_form("4111 1111 1111 1111"),
        )
        .await
        .expect("card payment should succeed");

    create.assert_async().await;
    verify.assert_async().await;
    assert_eq!(record.id, "P1");
    assert_eq!(record.status, PaymentStatus::Completed);
    assert_eq!(record.method, PaymentMethod::Card);
    assert_eq!(orchestrator.cache().payments(), vec![record]);
}

#[tokio::test]
async fn malformed_upi_id_fails_before_verification() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/payments/create-order")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"data":{"paymentId":"P2","amount":5000}}"#)
        .expect(1)
        .create_async()
        .await;
    let verify = server
        .mock("POST", "/payments/verify")
        .expect(0)
        .create_async()
        .await;

    let (orchestrator, _checkouts) = orchestrator(server.url());
    let mut flow = orchestrator
        .request_payment("B2", PaymentKind::Monthly, 5000)
        .expect("flow should open");
    orchestrator
        .choose_method(&mut flow, PaymentMethod::Upi)
        .await
        .expect("order should be created");
    assert_eq!(flow.order().map(|o| o.currency.as_str()), Some("INR"));

    let err = orchestrator
        .confirm(
            &mut flow,
            &FormData::Upi {
                upi_id: "not-an-id".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.field(), Some("upiId"));
    assert_eq!(flow.state(), FlowState::AwaitingConfirmation);
    create.assert_async().await;
    verify.assert_async().await;
}

#[tokio::test]
async fn short_card_number_fails_validation() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/payments/create-order")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"data":{"paymentId":"P3","amount":5000}}"#)
        .create_async()
        .await;
    let verify = server
        .mock("POST", "/payments/verify")
        .expect(0)
        .create_async()
        .await;

    let (orchestrator, _checkouts) = orchestrator(server.url());
    let err = orchestrator
        .pay(
            PaymentIntent::new("B3", 5000, PaymentKind::Advance, PaymentMethod::Card),
            &card_form("411111111111111"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.field(), Some("cardNumber"));
    verify.assert_async().await;
    assert!(!orchestrator.is_in_flight("B3"));
}

#[tokio::test]
async fn closing_gateway_checkout_leaves_cache_untouched() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/payments/create-order")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"success":true,"data":{"paymentId":"P4","orderId":"order_4","amount":5000,"currency":"INR"}}"#,
        )
        .create_async()
        .await;
    let verify = server
        .mock("POST", "/payments/verify")
        .expect(0)
        .create_async()
        .await;

    let (orchestrator, mut checkouts) = orchestrator(server.url());
    tokio::spawn(async move {
        if let Some(pending) = checkouts.recv().await {
            assert_eq!(pending.session.order_id, "order_4");
            pending.dismiss();
        }
    });

    let mut flow = orchestrator
        .request_payment("B4", PaymentKind::Advance, 5000)
        .expect("flow should open");
    orchestrator
        .choose_method(&mut flow, PaymentMethod::Razorpay)
        .await
        .expect("order should be created");
    let err = orchestrator
        .confirm(&mut flow, &FormData::None)
        .await
        .unwrap_err();

    assert_eq!(err, PaymentError::ConfirmationAbandoned);
    assert_eq!(flow.state(), FlowState::SelectingMethod);
    assert!(orchestrator.cache().payments().is_empty());
    verify.assert_async().await;
}

#[tokio::test]
async fn order_creation_failure_surfaces_backend_message_or_fallback() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/payments/create-order")
        .with_status(409)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Booking already paid"}"#)
        .create_async()
        .await;
    let _invoice = server
        .mock("POST", "/payments/invoices/I9/pay")
        .with_status(500)
        .create_async()
        .await;

    let (orchestrator, _checkouts) = orchestrator(server.url());
    let err = orchestrator
        .pay(
            PaymentIntent::new("B5", 5000, PaymentKind::Advance, PaymentMethod::Paytm),
            &FormData::None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Booking already paid");

    let err = orchestrator
        .pay(
            PaymentIntent::new("I9", 800, PaymentKind::Invoice, PaymentMethod::Paytm),
            &FormData::None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), ORDER_CREATION_FALLBACK);
}

#[tokio::test]
async fn repeated_verification_keeps_a_single_cached_record() {
    let mut server = Server::new_async().await;
    let verify = server
        .mock("POST", "/payments/verify")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"success":true,"data":{"_id":"P6","amount":5000,"status":"completed","method":"phonepe"}}"#,
        )
        .expect(2)
        .create_async()
        .await;

    let backend = Arc::new(
        HttpPaymentsBackend::from_config(&api_config(server.url())).expect("client"),
    );
    let verifier = Verifier::new(backend, PaymentCache::new());
    let payload = VerificationPayload {
        payment_id: "P6".to_string(),
        method: PaymentMethod::Phonepe,
        proof: VerificationProof::Wallet {
            wallet_transaction_id: "PHONEPE_1".to_string(),
        },
    };

    let first = verifier
        .verify(&payload, ConfirmationProtocol::WalletSimulated)
        .await
        .expect("first verify");
    let second = verifier
        .verify(&payload, ConfirmationProtocol::WalletSimulated)
        .await
        .expect("second verify");

    verify.assert_async().await;
    assert_eq!(first, second);
    assert_eq!(verifier.cache().payments().len(), 1);
    assert_eq!(
        verifier.cache().payment("P6").map(|r| r.status),
        Some(PaymentStatus::Completed)
    );
}
