//! End-to-end order lifecycle scenarios against in-memory collaborators.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use storefront_orders::actors::NotificationQueue;
use storefront_orders::domain::order::{
    AddressSnapshot, CartLine, CatalogPrice, FiscalPolicy, FiscalWindow, HumanCode, LifecycleState,
    Order, PaymentMethod, Shipment,
};
use storefront_orders::gateways::{
    sign_payment, verify_payment_signature, CarrierError, InMemoryAddressBook, InMemoryCartStore,
    InMemoryCatalog, InMemoryNotificationSender, InMemoryPromotions, PaymentError, PaymentGateway,
    PaymentIntent, ShipmentRequest, ShippingCarrier, TrackingSnapshot,
};
use storefront_orders::metrics::Metrics;
use storefront_orders::services::{
    Caller, Collaborators, CreateOrderRequest, OrderCodeGenerator, OrderLifecycle, OrderLookup,
    TrackingService, VerifyPaymentRequest,
};
use storefront_orders::store::{InMemoryOrderRepository, OrderRepository, RepositoryError};
use uuid::Uuid;
use storefront_orders::CheckoutError;

const SECRET: &str = "gateway-secret";
const OWNER: &str = "user-1";

// ── Fakes ──

#[derive(Default)]
struct FakePayments {
    fail_intents: AtomicBool,
    fail_verification: AtomicBool,
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_intent(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        if self.fail_intents.load(Ordering::SeqCst) {
            return Err(PaymentError::GatewayUnavailable("gateway down".to_string()));
        }
        Ok(PaymentIntent {
            id: format!("intent_{receipt}"),
            amount,
            currency: currency.to_string(),
            key_id: Some("key".to_string()),
        })
    }

    fn verify_signature(
        &self,
        intent_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, PaymentError> {
        if self.fail_verification.load(Ordering::SeqCst) {
            return Err(PaymentError::GatewayUnavailable("verification backend down".to_string()));
        }
        Ok(verify_payment_signature(intent_id, payment_id, signature, SECRET))
    }
}

#[derive(Default)]
struct FakeCarrier {
    bookings: AtomicU32,
    failures_left: AtomicU32,
    order_refs: tokio::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl ShippingCarrier for FakeCarrier {
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, CarrierError> {
        self.order_refs.lock().await.push(request.order_ref.clone());
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CarrierError::Unavailable("carrier timed out".to_string()));
        }
        let n = self.bookings.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Shipment {
            carrier_tracking_code: format!("AWB{n}"),
            carrier_name: "Delhivery".to_string(),
            carrier_shipment_id: n.to_string(),
            tracking_url: format!("https://track.example/AWB{n}"),
            status: "BOOKED".to_string(),
            pickup_date: None,
            delivery_estimate: None,
        })
    }

    async fn track(&self, tracking_code: &str) -> Result<TrackingSnapshot, CarrierError> {
        Ok(TrackingSnapshot {
            tracking_code: tracking_code.to_string(),
            current_status: "In Transit".to_string(),
            estimated_delivery: None,
            tracking_url: None,
            activities: vec![],
        })
    }
}

/// Delegates to the in-memory store but fails every conditional update.
struct UpdateTimesOut {
    inner: Arc<InMemoryOrderRepository>,
}

#[async_trait]
impl OrderRepository for UpdateTimesOut {
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        self.inner.create(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        self.inner.get(id).await
    }

    async fn find_by_code(&self, code: &HumanCode) -> Result<Option<Order>, RepositoryError> {
        self.inner.find_by_code(code).await
    }

    async fn update_if_state(
        &self,
        _order: &Order,
        _expected: LifecycleState,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Backend("timeout".to_string()))
    }

    async fn delete_if_state(&self, id: Uuid, expected: LifecycleState) -> Result<(), RepositoryError> {
        self.inner.delete_if_state(id, expected).await
    }

    async fn max_sequence_in_window(&self, window: &FiscalWindow) -> Result<Option<u32>, RepositoryError> {
        self.inner.max_sequence_in_window(window).await
    }

    async fn increment_sequence(&self, fiscal_key: &str, floor: u32) -> Result<u32, RepositoryError> {
        self.inner.increment_sequence(fiscal_key, floor).await
    }
}

// ── Harness ──

struct Harness {
    lifecycle: Arc<OrderLifecycle>,
    tracking: TrackingService,
    repository: Arc<InMemoryOrderRepository>,
    carts: Arc<InMemoryCartStore>,
    outbox: Arc<InMemoryNotificationSender>,
    payments: Arc<FakePayments>,
    carrier: Arc<FakeCarrier>,
}

fn may_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap()
}

fn address() -> AddressSnapshot {
    AddressSnapshot {
        customer_name: "Asha Rao".to_string(),
        line1: "12 MG Road".to_string(),
        line2: None,
        city: "Pune".to_string(),
        pincode: "411001".to_string(),
        state: "Maharashtra".to_string(),
        country: "India".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9999999999".to_string(),
    }
}

async fn harness_at(now: DateTime<Utc>) -> Harness {
    harness_with_store(now, |repository| repository).await
}

async fn harness_with_store(
    now: DateTime<Utc>,
    wrap: impl FnOnce(Arc<InMemoryOrderRepository>) -> Arc<dyn OrderRepository>,
) -> Harness {
    let metrics = Arc::new(Metrics::new().unwrap());
    let repository = Arc::new(InMemoryOrderRepository::new());
    let store: Arc<dyn OrderRepository> = wrap(repository.clone());

    let catalog = Arc::new(InMemoryCatalog::new());
    catalog
        .upsert(
            "P1",
            CatalogPrice {
                title: "Linen Shirt".to_string(),
                offer_price: 999,
                list_price: 1299,
            },
        )
        .await;

    let addresses = Arc::new(InMemoryAddressBook::new());
    addresses.insert(OWNER, "home", address()).await;
    addresses.insert("user-2", "home", address()).await;

    let promotions = Arc::new(InMemoryPromotions::new());
    promotions.insert("WELCOME100", 100).await;

    let carts = Arc::new(InMemoryCartStore::new());
    let outbox = Arc::new(InMemoryNotificationSender::new());
    let payments = Arc::new(FakePayments::default());
    let carrier = Arc::new(FakeCarrier::default());

    let collaborators = Collaborators {
        catalog,
        addresses,
        carts: carts.clone(),
        promotions,
        payments: payments.clone(),
        carrier: carrier.clone(),
        notifications: NotificationQueue::spawn(outbox.clone(), metrics.clone()),
    };

    let codes = OrderCodeGenerator::new(
        store.clone(),
        FiscalPolicy::new(4, 330, "W").unwrap(),
        5,
        metrics.clone(),
    );
    let lifecycle = OrderLifecycle::new(
        store.clone(),
        collaborators,
        storefront_orders::domain::order::PricingEngine::new(1800, 0),
        "INR",
        codes,
        metrics,
    )
    .with_clock(Arc::new(move || now));

    Harness {
        lifecycle: Arc::new(lifecycle),
        tracking: TrackingService::new(store, carrier.clone()),
        repository,
        carts,
        outbox,
        payments,
        carrier,
    }
}

fn request(method: PaymentMethod) -> CreateOrderRequest {
    CreateOrderRequest {
        lines: vec![CartLine::new("P1", 1)],
        address_ref: "home".to_string(),
        payment_method: method,
        promo_code: None,
        expected_total: None,
    }
}

fn signed(intent_id: &str, payment_id: &str) -> VerifyPaymentRequest {
    VerifyPaymentRequest {
        intent_id: intent_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: sign_payment(intent_id, payment_id, SECRET).unwrap(),
    }
}

async fn wait_for_sent(outbox: &InMemoryNotificationSender, expected: usize) {
    for _ in 0..100 {
        if outbox.sent().await.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {expected} notifications");
}

// ── Create ──

#[tokio::test]
async fn single_item_order_is_priced_and_numbered() {
    let h = harness_at(may_first()).await;

    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();

    assert_eq!(created.order.pricing.subtotal(), 999);
    assert_eq!(created.order.pricing.tax_amount(), 179);
    assert_eq!(created.order.pricing.total(), 1178);
    assert_eq!(created.order.human_code.as_str(), "25-26/W/0001");
    assert_eq!(created.order.lifecycle, LifecycleState::AwaitingPayment);

    let intent = created.payment_intent.unwrap();
    assert_eq!(intent.amount, 1178);
    assert_eq!(created.order.payment_intent_id.as_deref(), Some(intent.id.as_str()));

    let second = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();
    assert_eq!(second.order.human_code.as_str(), "25-26/W/0002");
}

#[tokio::test]
async fn numbering_restarts_in_new_fiscal_year() {
    let march = harness_at(Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap()).await;
    let created = march
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();
    assert_eq!(created.order.human_code.as_str(), "24-25/W/0001");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_get_distinct_codes() {
    let h = harness_at(may_first()).await;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let lifecycle = h.lifecycle.clone();
        handles.push(tokio::spawn(async move {
            lifecycle
                .create_order(OWNER, request(PaymentMethod::CashOnDelivery))
                .await
        }));
    }

    let mut sequences = HashSet::new();
    for handle in handles {
        let created = handle.await.unwrap().unwrap();
        assert!(!created.order.human_code.is_fallback());
        sequences.insert(created.order.human_code.sequence().unwrap());
    }

    assert_eq!(sequences.len(), 50);
    assert_eq!(sequences, (1..=50).collect::<HashSet<u32>>());
}

#[tokio::test]
async fn mismatched_client_total_is_rejected() {
    let h = harness_at(may_first()).await;
    let mut req = request(PaymentMethod::Online);
    req.expected_total = Some(999);

    let result = h.lifecycle.create_order(OWNER, req).await;
    assert!(matches!(result, Err(CheckoutError::Validation(_))));
}

#[tokio::test]
async fn promo_discount_reduces_total() {
    let h = harness_at(may_first()).await;
    let mut req = request(PaymentMethod::CashOnDelivery);
    req.promo_code = Some("WELCOME100".to_string());
    req.expected_total = Some(1078);

    let created = h.lifecycle.create_order(OWNER, req).await.unwrap();
    assert_eq!(created.order.pricing.discount(), 100);
    assert_eq!(created.order.pricing.total(), 1078);
}

#[tokio::test]
async fn unknown_promo_code_is_validation_error() {
    let h = harness_at(may_first()).await;
    let mut req = request(PaymentMethod::Online);
    req.promo_code = Some("NOPE".to_string());

    let result = h.lifecycle.create_order(OWNER, req).await;
    assert!(matches!(result, Err(CheckoutError::Validation(_))));
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let h = harness_at(may_first()).await;
    let mut req = request(PaymentMethod::Online);
    req.lines = vec![CartLine::new("GHOST", 1)];

    let result = h.lifecycle.create_order(OWNER, req).await;
    assert!(matches!(result, Err(CheckoutError::Validation(_))));
}

#[tokio::test]
async fn cash_on_delivery_is_paid_immediately() {
    let h = harness_at(may_first()).await;
    h.carts.put(OWNER, vec![CartLine::new("P1", 1)]).await;

    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();

    assert_eq!(created.order.lifecycle, LifecycleState::Paid);
    assert!(created.payment_intent.is_none());
    assert!(h.carts.lines(OWNER).await.is_empty());
    wait_for_sent(&h.outbox, 1).await;
}

#[tokio::test]
async fn failed_intent_withdraws_the_order() {
    let h = harness_at(may_first()).await;
    h.payments.fail_intents.store(true, Ordering::SeqCst);

    let result = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await;
    assert!(matches!(result, Err(CheckoutError::GatewayUnavailable(_))));

    let code = HumanCode::parse("25-26/W/0001").unwrap();
    assert!(h.repository.find_by_code(&code).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_intent_attach_withdraws_the_order() {
    let h = harness_with_store(may_first(), |repository| {
        Arc::new(UpdateTimesOut { inner: repository })
    })
    .await;

    let result = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await;
    assert!(result.is_err());

    let code = HumanCode::parse("25-26/W/0001").unwrap();
    assert!(h.repository.find_by_code(&code).await.unwrap().is_none());
    assert!(h.repository.is_empty().await);
}

// ── Verify payment ──

#[tokio::test]
async fn verified_payment_is_idempotent() {
    let h = harness_at(may_first()).await;
    h.carts.put(OWNER, vec![CartLine::new("P1", 1)]).await;

    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();
    let intent = created.payment_intent.unwrap();
    // Cart is untouched until payment succeeds.
    assert_eq!(h.carts.lines(OWNER).await.len(), 1);

    let paid = h
        .lifecycle
        .verify_payment(OWNER, created.order.id, signed(&intent.id, "pay_1"))
        .await
        .unwrap();
    assert_eq!(paid.lifecycle, LifecycleState::Paid);
    assert!(h.carts.lines(OWNER).await.is_empty());
    wait_for_sent(&h.outbox, 1).await;

    // Refill the cart; a repeated verification must not clear it again.
    h.carts.put(OWNER, vec![CartLine::new("P1", 2)]).await;
    let again = h
        .lifecycle
        .verify_payment(OWNER, created.order.id, signed(&intent.id, "pay_1"))
        .await
        .unwrap();
    assert_eq!(again.lifecycle, LifecycleState::Paid);
    assert_eq!(h.carts.lines(OWNER).await.len(), 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.outbox.sent().await.len(), 1);
}

#[tokio::test]
async fn signature_mismatch_deletes_the_order() {
    let h = harness_at(may_first()).await;
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();
    let intent = created.payment_intent.unwrap();

    let forged = VerifyPaymentRequest {
        intent_id: intent.id.clone(),
        payment_id: "pay_1".to_string(),
        signature: sign_payment(&intent.id, "pay_1", "wrong-secret").unwrap(),
    };
    let result = h.lifecycle.verify_payment(OWNER, created.order.id, forged).await;
    assert!(matches!(result, Err(CheckoutError::SignatureMismatch)));

    assert!(h.repository.get(created.order.id).await.unwrap().is_none());

    let retry = h
        .lifecycle
        .verify_payment(OWNER, created.order.id, signed(&intent.id, "pay_1"))
        .await;
    assert!(matches!(retry, Err(CheckoutError::NotFound(_))));
}

#[tokio::test]
async fn unavailable_verification_deletes_the_order() {
    let h = harness_at(may_first()).await;
    h.carts.put(OWNER, vec![CartLine::new("P1", 1)]).await;
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();
    let intent = created.payment_intent.unwrap();
    h.payments.fail_verification.store(true, Ordering::SeqCst);

    let result = h
        .lifecycle
        .verify_payment(OWNER, created.order.id, signed(&intent.id, "pay_1"))
        .await;
    assert!(matches!(result, Err(CheckoutError::GatewayUnavailable(_))));

    assert!(h.repository.get(created.order.id).await.unwrap().is_none());
    assert_eq!(h.carts.lines(OWNER).await.len(), 1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.outbox.sent().await.is_empty());
}

#[tokio::test]
async fn verification_with_foreign_intent_is_rejected_without_compensation() {
    let h = harness_at(may_first()).await;
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();

    let result = h
        .lifecycle
        .verify_payment(OWNER, created.order.id, signed("intent_other", "pay_1"))
        .await;
    assert!(matches!(result, Err(CheckoutError::Validation(_))));

    let stored = h.repository.get(created.order.id).await.unwrap().unwrap();
    assert_eq!(stored.lifecycle, LifecycleState::AwaitingPayment);
}

#[tokio::test]
async fn other_users_cannot_touch_an_order() {
    let h = harness_at(may_first()).await;
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();
    let intent = created.payment_intent.unwrap();

    let verify = h
        .lifecycle
        .verify_payment("user-2", created.order.id, signed(&intent.id, "pay_1"))
        .await;
    assert!(matches!(verify, Err(CheckoutError::Unauthorized)));

    let cancel = h.lifecycle.cancel_pending("user-2", created.order.id).await;
    assert!(matches!(cancel, Err(CheckoutError::Unauthorized)));

    let track = h
        .tracking
        .track("user-2", OrderLookup::Id(created.order.id))
        .await;
    assert!(matches!(track, Err(CheckoutError::Unauthorized)));
}

// ── Cancel ──

#[tokio::test]
async fn abandoned_online_order_can_be_cancelled() {
    let h = harness_at(may_first()).await;
    h.carts.put(OWNER, vec![CartLine::new("P1", 1)]).await;

    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();

    h.lifecycle.cancel_pending(OWNER, created.order.id).await.unwrap();

    assert!(h.repository.get(created.order.id).await.unwrap().is_none());
    assert_eq!(h.carts.lines(OWNER).await.len(), 1);
}

#[tokio::test]
async fn paid_order_cannot_be_cancelled() {
    let h = harness_at(may_first()).await;
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();

    let result = h.lifecycle.cancel_pending(OWNER, created.order.id).await;
    assert!(matches!(result, Err(CheckoutError::StatePrecondition(_))));

    let stored = h.repository.get(created.order.id).await.unwrap().unwrap();
    assert_eq!(stored.lifecycle, LifecycleState::Paid);
}

#[tokio::test]
async fn cancelled_codes_are_not_reused() {
    let h = harness_at(may_first()).await;
    let first = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();
    h.lifecycle.cancel_pending(OWNER, first.order.id).await.unwrap();

    let second = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();
    assert_eq!(second.order.human_code.as_str(), "25-26/W/0002");
}

// ── Shipment and tracking ──

#[tokio::test]
async fn paid_order_ships_once() {
    let h = harness_at(may_first()).await;
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();

    let owner = Caller::Customer(OWNER.to_string());
    let shipment = h.lifecycle.request_shipment(&owner, created.order.id).await.unwrap();
    assert_eq!(shipment.carrier_tracking_code, "AWB1");
    assert_eq!(*h.carrier.order_refs.lock().await, vec!["25-26/W/0001".to_string()]);

    let stored = h.repository.get(created.order.id).await.unwrap().unwrap();
    assert_eq!(stored.lifecycle, LifecycleState::Shipped);
    assert_eq!(stored.shipment.as_ref(), Some(&shipment));

    let again = h.lifecycle.request_shipment(&owner, created.order.id).await.unwrap();
    assert_eq!(again, shipment);
    assert_eq!(h.carrier.bookings.load(Ordering::SeqCst), 1);

    let view = h
        .tracking
        .track(OWNER, OrderLookup::Code(stored.human_code.clone()))
        .await
        .unwrap();
    assert_eq!(view.shipment, Some(shipment));
    assert_eq!(view.real_time_tracking.unwrap().current_status, "In Transit");
}

#[tokio::test]
async fn unpaid_order_cannot_ship() {
    let h = harness_at(may_first()).await;
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::Online))
        .await
        .unwrap();

    let result = h
        .lifecycle
        .request_shipment(&Caller::Customer(OWNER.to_string()), created.order.id)
        .await;
    assert!(matches!(result, Err(CheckoutError::StatePrecondition(_))));
    assert_eq!(h.carrier.bookings.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn flaky_carrier_leaves_order_fulfilling_until_retried() {
    let h = harness_at(may_first()).await;
    h.carrier.failures_left.store(2, Ordering::SeqCst);
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();
    let owner = Caller::Customer(OWNER.to_string());

    let first = h.lifecycle.request_shipment(&owner, created.order.id).await;
    assert!(matches!(first, Err(CheckoutError::Carrier(_))));

    let stored = h.repository.get(created.order.id).await.unwrap().unwrap();
    assert_eq!(stored.lifecycle, LifecycleState::Fulfilling);
    assert!(stored.shipment.is_none());

    let shipment = h.lifecycle.request_shipment(&owner, created.order.id).await.unwrap();
    assert_eq!(shipment.carrier_tracking_code, "AWB1");

    let stored = h.repository.get(created.order.id).await.unwrap().unwrap();
    assert_eq!(stored.lifecycle, LifecycleState::Shipped);
    assert_eq!(stored.shipment, Some(shipment));

    let refs = h.carrier.order_refs.lock().await.clone();
    assert_eq!(refs, vec!["25-26/W/0001".to_string(); 3]);
}

#[tokio::test]
async fn only_owner_or_back_office_can_ship() {
    let h = harness_at(may_first()).await;
    let created = h
        .lifecycle
        .create_order(OWNER, request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();

    let stranger = h
        .lifecycle
        .request_shipment(&Caller::Customer("user-2".to_string()), created.order.id)
        .await;
    assert!(matches!(stranger, Err(CheckoutError::Unauthorized)));
    assert!(h.carrier.order_refs.lock().await.is_empty());

    let stored = h.repository.get(created.order.id).await.unwrap().unwrap();
    assert_eq!(stored.lifecycle, LifecycleState::Paid);

    let shipment = h
        .lifecycle
        .request_shipment(&Caller::BackOffice("ops-1".to_string()), created.order.id)
        .await
        .unwrap();
    assert_eq!(shipment.carrier_tracking_code, "AWB1");
}
