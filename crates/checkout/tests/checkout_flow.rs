//! End-to-end checkout and reconciliation scenarios.

use std::sync::Arc;

use checkout::{
    CallbackError, CartLine, CheckoutError, CheckoutOrchestrator, CallbackReconciler,
    CheckoutReceipt, CustomerDetails, ReconcileOutcome,
};
use domain::{
    CorrelationId, Money, OrderStatus, OrderPaymentStatus, PaymentStatus, Product, ProductId,
    UserId,
};
use gateway::MockGateway;
use store::{MemoryStore, StoreError, TxStore};

struct Harness {
    store: MemoryStore,
    gateway: MockGateway,
    orchestrator: Arc<CheckoutOrchestrator<MemoryStore, MockGateway>>,
    reconciler: CallbackReconciler<MemoryStore>,
}

async fn harness(stock: u32) -> Harness {
    let store = MemoryStore::new();
    store
        .transaction::<_, StoreError, _>(move |docs| {
            docs.put_product(Product::new(
                "SKU-STICK",
                "Hockey Stick",
                Money::from_units(12_000),
                stock,
            ));
            Ok(())
        })
        .await
        .unwrap();

    let gateway = MockGateway::new();
    Harness {
        store: store.clone(),
        gateway: gateway.clone(),
        orchestrator: Arc::new(CheckoutOrchestrator::new(store.clone(), gateway)),
        reconciler: CallbackReconciler::new(store),
    }
}

fn customer() -> CustomerDetails {
    CustomerDetails {
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        phone_number: "254712345678".to_string(),
    }
}

fn stick_cart(quantity: u32) -> Vec<CartLine> {
    vec![CartLine {
        product_id: ProductId::new("SKU-STICK"),
        quantity,
    }]
}

fn callback_payload(correlation_id: &CorrelationId, result_code: i64) -> serde_json::Value {
    let mut stk = serde_json::json!({
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": correlation_id.as_str(),
        "ResultCode": result_code,
        "ResultDesc": if result_code == 0 {
            "The service request is processed successfully."
        } else {
            "Request cancelled by user"
        },
    });
    if result_code == 0 {
        stk["CallbackMetadata"] = serde_json::json!({
            "Item": [
                { "Name": "Amount", "Value": 12000 },
                { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                { "Name": "PhoneNumber", "Value": 254708374149u64 }
            ]
        });
    }
    serde_json::json!({ "Body": { "stkCallback": stk } })
}

async fn stock_of(store: &MemoryStore, sku: &str) -> u32 {
    let id = ProductId::new(sku);
    store
        .read(move |docs| docs.product(&id).map(|p| p.stock))
        .await
        .unwrap()
        .unwrap()
}

async fn successful_checkout(h: &Harness) -> CheckoutReceipt {
    h.orchestrator
        .checkout(UserId::new(), stick_cart(1), customer())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_checkout_reserves_stock_and_computes_server_side_total() {
    let h = harness(5).await;
    let receipt = successful_checkout(&h).await;

    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 4);
    assert_eq!(
        Some(&receipt.correlation_id),
        h.gateway.last_correlation_id().as_ref()
    );

    h.store
        .read(move |docs| {
            let order = docs.order(&receipt.order_id).unwrap();
            assert_eq!(order.total, Money::from_units(12_000));
            assert_eq!(order.status, OrderStatus::Pending);
            assert_eq!(order.payment_status, OrderPaymentStatus::Pending);

            let payment = docs.payment(&receipt.payment_id).unwrap();
            assert_eq!(payment.status, PaymentStatus::Pending);
            assert_eq!(payment.amount, order.total);
            assert_eq!(payment.order_id, order.id);
        })
        .await
        .unwrap();

    // The initiation carried the rounded amount and the order reference.
    let initiation = h.gateway.last_initiation().unwrap();
    assert_eq!(initiation.amount.round_to_units(), 12_000);
    assert!(initiation.account_reference.starts_with("ORDER_"));
}

#[tokio::test]
async fn test_insufficient_stock_is_all_or_nothing() {
    let h = harness(5).await;
    let err = h
        .orchestrator
        .checkout(UserId::new(), stick_cart(6), customer())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock {
            requested: 6,
            available: 5,
            ..
        }
    ));
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);
    assert_eq!(h.gateway.initiation_count(), 0);
    h.store
        .read(|docs| {
            assert_eq!(docs.orders().count(), 0);
            assert_eq!(docs.payments().count(), 0);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_mixed_cart_failure_reserves_nothing() {
    let h = harness(5).await;
    let cart = vec![
        CartLine {
            product_id: ProductId::new("SKU-STICK"),
            quantity: 1,
        },
        CartLine {
            product_id: ProductId::new("SKU-MISSING"),
            quantity: 1,
        },
    ];
    let err = h
        .orchestrator
        .checkout(UserId::new(), cart, customer())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::ProductNotFound(_)));
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);
}

#[tokio::test]
async fn test_validation_rejects_before_any_mutation() {
    let h = harness(5).await;

    let empty = h
        .orchestrator
        .checkout(UserId::new(), Vec::new(), customer())
        .await
        .unwrap_err();
    assert!(matches!(empty, CheckoutError::Validation(_)));

    let zero_quantity = h
        .orchestrator
        .checkout(UserId::new(), stick_cart(0), customer())
        .await
        .unwrap_err();
    assert!(matches!(zero_quantity, CheckoutError::Validation(_)));

    let bad_phone = h
        .orchestrator
        .checkout(
            UserId::new(),
            stick_cart(1),
            CustomerDetails {
                phone_number: "0712345678".to_string(),
                ..customer()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(bad_phone, CheckoutError::Validation(_)));

    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);
    assert_eq!(h.gateway.initiation_count(), 0);
}

#[tokio::test]
async fn test_gateway_rejection_releases_the_reservation() {
    let h = harness(5).await;
    h.gateway.set_rejection("1", "Insufficient funds on the utility account");

    let err = h
        .orchestrator
        .checkout(UserId::new(), stick_cart(1), customer())
        .await
        .unwrap_err();

    match err {
        CheckoutError::GatewayRejected { description } => {
            assert_eq!(description, "Insufficient funds on the utility account");
        }
        other => panic!("expected GatewayRejected, got {other:?}"),
    }
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);
}

#[tokio::test]
async fn test_gateway_transport_failure_releases_the_reservation() {
    let h = harness(5).await;
    h.gateway.set_unreachable(true);

    let err = h
        .orchestrator
        .checkout(UserId::new(), stick_cart(1), customer())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::GatewayUnreachable(_)));
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);
    h.store
        .read(|docs| {
            assert_eq!(docs.orders().count(), 0);
            assert_eq!(docs.payments().count(), 0);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_auth_failure_releases_the_reservation() {
    let h = harness(5).await;
    h.gateway.set_fail_authorize(true);

    let err = h
        .orchestrator
        .checkout(UserId::new(), stick_cart(1), customer())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::AuthFailed(_)));
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);
    assert_eq!(h.gateway.initiation_count(), 0);
}

#[tokio::test]
async fn test_success_callback_marks_order_paid() {
    let h = harness(5).await;
    let receipt = successful_checkout(&h).await;

    let outcome = h
        .reconciler
        .reconcile(callback_payload(&receipt.correlation_id, 0))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        ReconcileOutcome::Applied {
            status: PaymentStatus::Completed,
            ..
        }
    ));

    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 4);
    h.store
        .read(move |docs| {
            let payment = docs.payment(&receipt.payment_id).unwrap();
            assert_eq!(payment.status, PaymentStatus::Completed);

            let order = docs.order(&receipt.order_id).unwrap();
            assert_eq!(order.status, OrderStatus::Paid);
            assert_eq!(order.payment_status, OrderPaymentStatus::Completed);
            assert!(order.payment_completed_at.is_some());
            // Phone refreshed from the callback metadata.
            assert_eq!(order.customer.phone.as_str(), "254708374149");
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failure_callback_restores_stock() {
    let h = harness(5).await;
    let receipt = successful_checkout(&h).await;
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 4);

    let outcome = h
        .reconciler
        .reconcile(callback_payload(&receipt.correlation_id, 1))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        ReconcileOutcome::Applied {
            status: PaymentStatus::Failed,
            ..
        }
    ));

    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);
    h.store
        .read(move |docs| {
            let order = docs.order(&receipt.order_id).unwrap();
            assert_eq!(order.status, OrderStatus::PaymentFailed);
            assert_eq!(order.payment_status, OrderPaymentStatus::Failed);
            assert!(order.payment_completed_at.is_none());
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_replayed_callback_never_double_compensates() {
    let h = harness(5).await;
    let receipt = successful_checkout(&h).await;

    let payload = callback_payload(&receipt.correlation_id, 1);
    h.reconciler.reconcile(payload.clone()).await.unwrap();
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);

    let settled_at = h
        .store
        .read(move |docs| docs.payment(&receipt.payment_id).unwrap().updated_at)
        .await
        .unwrap();

    let replay = h.reconciler.reconcile(payload).await.unwrap();
    assert!(matches!(
        replay,
        ReconcileOutcome::AlreadySettled {
            status: PaymentStatus::Failed,
            ..
        }
    ));

    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5, "no double restore");
    let after_replay = h
        .store
        .read(move |docs| docs.payment(&receipt.payment_id).unwrap().updated_at)
        .await
        .unwrap();
    assert_eq!(after_replay, settled_at, "no write after the terminal one");
}

#[tokio::test]
async fn test_conflicting_late_callback_is_ignored() {
    let h = harness(5).await;
    let receipt = successful_checkout(&h).await;

    h.reconciler
        .reconcile(callback_payload(&receipt.correlation_id, 1))
        .await
        .unwrap();
    // A success notification arriving after the failure settled changes
    // nothing: the first terminal outcome wins.
    let late = h
        .reconciler
        .reconcile(callback_payload(&receipt.correlation_id, 0))
        .await
        .unwrap();
    assert!(matches!(late, ReconcileOutcome::AlreadySettled { .. }));

    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 5);
    h.store
        .read(move |docs| {
            assert_eq!(
                docs.order(&receipt.order_id).unwrap().status,
                OrderStatus::PaymentFailed
            );
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_correlation_id_is_rejected_without_writes() {
    let h = harness(5).await;
    let receipt = successful_checkout(&h).await;

    let err = h
        .reconciler
        .reconcile(callback_payload(&CorrelationId::new("ws_CO_UNKNOWN"), 0))
        .await
        .unwrap_err();
    assert!(matches!(err, CallbackError::UnknownPayment(_)));

    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 4);
    h.store
        .read(move |docs| {
            assert_eq!(
                docs.payment(&receipt.payment_id).unwrap().status,
                PaymentStatus::Pending
            );
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_malformed_callback_is_rejected_without_writes() {
    let h = harness(5).await;
    successful_checkout(&h).await;

    let err = h
        .reconciler
        .reconcile(serde_json::json!({ "Body": {} }))
        .await
        .unwrap_err();
    assert!(matches!(err, CallbackError::Malformed(_)));
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_checkouts_for_the_last_unit() {
    let h = harness(1).await;

    let attempt = |orchestrator: Arc<CheckoutOrchestrator<MemoryStore, MockGateway>>| async move {
        orchestrator
            .checkout(UserId::new(), stick_cart(1), customer())
            .await
    };

    let (a, b) = tokio::join!(
        attempt(h.orchestrator.clone()),
        attempt(h.orchestrator.clone())
    );

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one checkout may win the last unit");
    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(loser, CheckoutError::InsufficientStock { .. }));
    assert_eq!(stock_of(&h.store, "SKU-STICK").await, 0);
}
