use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::identifier::OrderCodeGenerator;
use crate::actors::NotificationQueue;
use crate::domain::order::*;
use crate::domain::DomainEvent;
use crate::error::CheckoutError;
use crate::gateways::{
    AddressBook, CartStore, Catalog, CollaboratorError, OrderSummary, PaymentGateway, PaymentIntent,
    Promotions, ShipmentRequest, ShippingCarrier,
};
use crate::metrics::Metrics;
use crate::store::{OrderRepository, RepositoryError};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Order Lifecycle Orchestrator
// ============================================================================
//
// Drives an order through pricing, numbering, payment and shipment. Steps for
// one order run strictly in sequence; every write after creation is a
// compare-and-set on the lifecycle state, so a cancel racing a verify (or two
// verifies) cannot both win.
//
// Invariants:
// - The total is always computed here, never taken from the caller
// - An ONLINE order never stays half-paid: it ends PAID or deleted
// - Notifications are queued after PAID and never fail the transition
// - The carrier request always carries the order's human code
//
// ============================================================================

const CODE_ALLOCATION_ATTEMPTS: u32 = 3;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Who is acting on an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Customer(String),
    /// Operations staff; may act on any customer's order.
    BackOffice(String),
}

impl Caller {
    pub fn id(&self) -> &str {
        match self {
            Caller::Customer(id) | Caller::BackOffice(id) => id,
        }
    }

    fn may_manage(&self, order: &Order) -> bool {
        match self {
            Caller::BackOffice(_) => true,
            Caller::Customer(id) => order.owner_id == *id,
        }
    }
}

/// External services the lifecycle depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub addresses: Arc<dyn AddressBook>,
    pub carts: Arc<dyn CartStore>,
    pub promotions: Arc<dyn Promotions>,
    pub payments: Arc<dyn PaymentGateway>,
    pub carrier: Arc<dyn ShippingCarrier>,
    pub notifications: NotificationQueue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub lines: Vec<CartLine>,
    pub address_ref: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Total the client displayed; only compared, never stored.
    #[serde(default)]
    pub expected_total: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent: Option<PaymentIntent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub intent_id: String,
    pub payment_id: String,
    pub signature: String,
}

pub struct OrderLifecycle {
    repository: Arc<dyn OrderRepository>,
    codes: OrderCodeGenerator,
    pricing: PricingEngine,
    currency: String,
    collaborators: Collaborators,
    metrics: Arc<Metrics>,
    clock: Clock,
}

impl OrderLifecycle {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        collaborators: Collaborators,
        pricing: PricingEngine,
        currency: impl Into<String>,
        codes: OrderCodeGenerator,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repository,
            codes,
            pricing,
            currency: currency.into(),
            collaborators,
            metrics,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn load(&self, order_id: Uuid) -> Result<Order, CheckoutError> {
        self.repository
            .get(order_id)
            .await?
            .ok_or(CheckoutError::NotFound("Order"))
    }

    async fn load_owned(&self, owner_id: &str, order_id: Uuid) -> Result<Order, CheckoutError> {
        let order = self.load(order_id).await?;
        if order.owner_id != owner_id {
            tracing::warn!(order_id = %order_id, "Order accessed by a different user");
            return Err(CheckoutError::Unauthorized);
        }
        Ok(order)
    }

    /// Run `command` against `order`, stamped with the injected clock.
    fn transition(
        &self,
        order: &Order,
        command: &OrderCommand,
    ) -> Result<(Order, Vec<OrderEvent>), OrderError> {
        order.execute_at(command, (self.clock)())
    }

    /// Log events whose write has landed.
    fn record_events(&self, order: &Order, events: &[OrderEvent]) {
        for event in events {
            tracing::info!(
                order_id = %order.id,
                human_code = %order.human_code,
                event = event.event_type(),
                "Order event recorded"
            );
        }
    }

    // ========================================================================
    // Create
    // ========================================================================

    pub async fn create_order(
        &self,
        owner_id: &str,
        request: CreateOrderRequest,
    ) -> Result<CreatedOrder, CheckoutError> {
        if request.address_ref.trim().is_empty() {
            return Err(CheckoutError::Validation("A delivery address is required".to_string()));
        }

        let address = self
            .collaborators
            .addresses
            .get_address(owner_id, &request.address_ref)
            .await?
            .ok_or(CheckoutError::NotFound("Address"))?;

        let mut prices = HashMap::new();
        for line in &request.lines {
            if prices.contains_key(&line.product_ref) {
                continue;
            }
            if let Some(price) = self.collaborators.catalog.get_price(&line.product_ref).await? {
                prices.insert(line.product_ref.clone(), price);
            }
        }

        let discount = self
            .collaborators
            .promotions
            .discount_for(owner_id, &request.lines, request.promo_code.as_deref())
            .await
            .map_err(|error| match error {
                CollaboratorError::NotFound(_) => {
                    CheckoutError::Validation("Promo code is not valid".to_string())
                }
                other => other.into(),
            })?;

        let priced = self.pricing.price(&request.lines, &prices, discount)?;

        if let Some(expected) = request.expected_total {
            if expected != priced.pricing.total() {
                tracing::warn!(
                    owner_id = %owner_id,
                    expected,
                    computed = priced.pricing.total(),
                    "Client total does not match computed total"
                );
                return Err(CheckoutError::Validation(
                    "Order total has changed, please review your cart".to_string(),
                ));
            }
        }

        let order = self.persist_new(owner_id, &request, priced).await?;
        self.metrics.record_order_created(order.payment_method.as_str());

        tracing::info!(
            order_id = %order.id,
            human_code = %order.human_code,
            payment_method = order.payment_method.as_str(),
            total = order.pricing.total(),
            "Order created"
        );

        match order.payment_method {
            PaymentMethod::CashOnDelivery => {
                self.after_paid(&order, Some(&address)).await;
                Ok(CreatedOrder {
                    order,
                    payment_intent: None,
                })
            }
            PaymentMethod::Online => self.open_payment(order).await,
        }
    }

    /// Allocate a code and persist, regenerating when the code is already taken.
    async fn persist_new(
        &self,
        owner_id: &str,
        request: &CreateOrderRequest,
        priced: PricedCart,
    ) -> Result<Order, CheckoutError> {
        let order_id = self.repository.allocate_id();
        let follow_up = match request.payment_method {
            PaymentMethod::CashOnDelivery => OrderCommand::AcceptCashOnDelivery,
            PaymentMethod::Online => OrderCommand::RequestPayment,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = (self.clock)();
            let human_code = self.codes.next_code(now).await?;

            let (order, events) = Order::place(
                OrderPlaced {
                    order_id,
                    human_code,
                    owner_id: owner_id.to_string(),
                    line_items: priced.items.clone(),
                    pricing: priced.pricing,
                    currency: self.currency.clone(),
                    payment_method: request.payment_method,
                    address_ref: request.address_ref.clone(),
                    placed_at: now,
                },
                std::slice::from_ref(&follow_up),
            )?;

            match self.repository.create(&order).await {
                Ok(()) => {
                    self.record_events(&order, &events);
                    return Ok(order);
                }
                Err(RepositoryError::DuplicateCode(code)) if attempt < CODE_ALLOCATION_ATTEMPTS => {
                    tracing::warn!(human_code = %code, attempt, "Order code already taken, regenerating");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Create the gateway intent for a freshly persisted ONLINE order.
    async fn open_payment(&self, order: Order) -> Result<CreatedOrder, CheckoutError> {
        let intent = match self
            .collaborators
            .payments
            .create_intent(order.pricing.total(), &order.currency, order.human_code.as_str())
            .await
        {
            Ok(intent) => intent,
            Err(error) => {
                tracing::warn!(order_id = %order.id, error = %error, "Payment intent failed, withdrawing order");
                self.remove_pending(&order, "intent_failed").await;
                return Err(error.into());
            }
        };

        let attach = OrderCommand::AttachPaymentIntent {
            intent_id: intent.id.clone(),
        };
        let (attached, events) = match self.transition(&order, &attach) {
            Ok(attached) => attached,
            Err(error) => {
                self.remove_pending(&order, "intent_attach_failed").await;
                return Err(error.into());
            }
        };

        // Without the intent id stored nobody can verify or cancel the order.
        if let Err(error) = self
            .repository
            .update_if_state(&attached, LifecycleState::AwaitingPayment)
            .await
        {
            tracing::warn!(order_id = %order.id, error = %error, "Could not attach payment intent, withdrawing order");
            self.remove_pending(&order, "intent_attach_failed").await;
            return Err(error.into());
        }
        self.record_events(&attached, &events);

        Ok(CreatedOrder {
            order: attached,
            payment_intent: Some(intent),
        })
    }

    // ========================================================================
    // Verify payment
    // ========================================================================

    pub async fn verify_payment(
        &self,
        owner_id: &str,
        order_id: Uuid,
        request: VerifyPaymentRequest,
    ) -> Result<Order, CheckoutError> {
        let order = self.load_owned(owner_id, order_id).await?;

        if order.is_paid() {
            tracing::info!(order_id = %order_id, "Payment already verified; nothing to do");
            self.metrics.record_verification("duplicate");
            return Ok(order);
        }
        if order.lifecycle != LifecycleState::AwaitingPayment {
            return Err(OrderError::NotAwaitingPayment(order.lifecycle).into());
        }
        if order.payment_intent_id.as_deref() != Some(request.intent_id.as_str()) {
            return Err(CheckoutError::Validation(
                "Payment does not belong to this order".to_string(),
            ));
        }

        let verified = self.collaborators.payments.verify_signature(
            &request.intent_id,
            &request.payment_id,
            &request.signature,
        );

        match verified {
            Ok(true) => self.confirm_payment(order, request).await,
            Ok(false) => {
                tracing::warn!(order_id = %order_id, "Payment signature mismatch");
                self.metrics.record_verification("signature_mismatch");
                self.reject_payment(order, "signature_mismatch").await;
                Err(CheckoutError::SignatureMismatch)
            }
            Err(error) => {
                tracing::error!(order_id = %order_id, error = %error, "Payment verification unavailable");
                self.metrics.record_verification("gateway_error");
                self.reject_payment(order, "verification_unavailable").await;
                Err(error.into())
            }
        }
    }

    async fn confirm_payment(
        &self,
        order: Order,
        request: VerifyPaymentRequest,
    ) -> Result<Order, CheckoutError> {
        let (paid, events) = self.transition(
            &order,
            &OrderCommand::ConfirmPayment {
                payment_ref: PaymentRef {
                    gateway_order_id: request.intent_id,
                    gateway_payment_id: request.payment_id,
                    gateway_signature: request.signature,
                },
            },
        )?;

        match self
            .repository
            .update_if_state(&paid, LifecycleState::AwaitingPayment)
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::PreconditionFailed { .. }) => {
                // A concurrent verification may already have won.
                let current = self.load(order.id).await?;
                if current.is_paid() {
                    self.metrics.record_verification("duplicate");
                    return Ok(current);
                }
                return Err(OrderError::NotAwaitingPayment(current.lifecycle).into());
            }
            Err(error) => return Err(error.into()),
        }

        self.record_events(&paid, &events);
        self.metrics.record_verification("paid");
        tracing::info!(order_id = %paid.id, human_code = %paid.human_code, "Payment verified");

        self.after_paid(&paid, None).await;
        Ok(paid)
    }

    /// Move a pending order to PAYMENT_FAILED and delete it. If the delete
    /// fails the order stays in the terminal PAYMENT_FAILED state.
    async fn reject_payment(&self, order: Order, reason: &'static str) {
        let (failed, events) = match self.transition(
            &order,
            &OrderCommand::RejectPayment {
                reason: reason.to_string(),
            },
        ) {
            Ok(rejected) => rejected,
            Err(error) => {
                tracing::warn!(order_id = %order.id, error = %error, "Cannot reject payment");
                return;
            }
        };

        if let Err(error) = self
            .repository
            .update_if_state(&failed, LifecycleState::AwaitingPayment)
            .await
        {
            tracing::warn!(order_id = %order.id, error = %error, "Could not mark payment failed");
            return;
        }
        self.record_events(&failed, &events);

        self.remove_pending(&failed, reason).await;
    }

    /// Best-effort delete of an unpaid order.
    async fn remove_pending(&self, order: &Order, reason: &'static str) {
        match self.repository.delete_if_state(order.id, order.lifecycle).await {
            Ok(()) => {
                self.metrics.record_compensation(reason);
                tracing::info!(
                    order_id = %order.id,
                    human_code = %order.human_code,
                    reason,
                    "Pending order removed"
                );
            }
            Err(error) => {
                tracing::error!(
                    order_id = %order.id,
                    state = %order.lifecycle,
                    error = %error,
                    reason,
                    "Compensating delete failed"
                );
            }
        }
    }

    /// Side effects of reaching PAID: clear the cart, queue the confirmation.
    /// Neither can fail the order.
    async fn after_paid(&self, order: &Order, address: Option<&AddressSnapshot>) {
        if let Err(error) = self.collaborators.carts.clear(&order.owner_id).await {
            tracing::warn!(order_id = %order.id, error = %error, "Cart clear failed after payment");
        }

        let address = match address {
            Some(address) => Some(address.clone()),
            None => self
                .collaborators
                .addresses
                .get_address(&order.owner_id, &order.address_ref)
                .await
                .ok()
                .flatten(),
        };

        match address {
            Some(address) => {
                self.collaborators
                    .notifications
                    .submit(OrderSummary::new(order, &address));
            }
            None => {
                self.metrics.record_notification("skipped");
                tracing::warn!(order_id = %order.id, "No address for confirmation; notification skipped");
            }
        }
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    /// Delete an unpaid order the buyer walked away from. The cart is left
    /// untouched.
    pub async fn cancel_pending(&self, owner_id: &str, order_id: Uuid) -> Result<(), CheckoutError> {
        let order = self.load_owned(owner_id, order_id).await?;

        let (_, events) = self.transition(
            &order,
            &OrderCommand::CancelPending {
                reason: "cancelled by customer".to_string(),
            },
        )?;

        self.repository
            .delete_if_state(order.id, order.lifecycle)
            .await?;
        self.record_events(&order, &events);

        self.metrics.record_compensation("cancelled");
        tracing::info!(order_id = %order_id, human_code = %order.human_code, "Pending order cancelled");
        Ok(())
    }

    // ========================================================================
    // Shipment
    // ========================================================================

    /// Book the shipment for a paid order. Safe to call again after a carrier
    /// failure; an already shipped order returns its stored shipment.
    pub async fn request_shipment(&self, caller: &Caller, order_id: Uuid) -> Result<Shipment, CheckoutError> {
        let order = self.load(order_id).await?;
        if !caller.may_manage(&order) {
            tracing::warn!(order_id = %order_id, caller = %caller.id(), "Shipment requested by a non-owner");
            return Err(CheckoutError::Unauthorized);
        }

        let fulfilling = match order.lifecycle {
            LifecycleState::Shipped => return self.stored_shipment(order),
            LifecycleState::Fulfilling => order,
            _ => {
                let (fulfilling, events) = self.transition(&order, &OrderCommand::StartFulfillment)?;
                match self.repository.update_if_state(&fulfilling, order.lifecycle).await {
                    Ok(()) => {
                        self.record_events(&fulfilling, &events);
                        fulfilling
                    }
                    Err(RepositoryError::PreconditionFailed { .. }) => {
                        let current = self.load(order_id).await?;
                        match current.lifecycle {
                            LifecycleState::Shipped => return self.stored_shipment(current),
                            LifecycleState::Fulfilling => current,
                            other => return Err(OrderError::NotPaid(other).into()),
                        }
                    }
                    Err(error) => return Err(error.into()),
                }
            }
        };

        let address = self
            .collaborators
            .addresses
            .get_address(&fulfilling.owner_id, &fulfilling.address_ref)
            .await?
            .ok_or(CheckoutError::NotFound("Address"))?;
        let request = ShipmentRequest::from_order(&fulfilling, &address);

        let carrier = &self.collaborators.carrier;
        let request_ref = &request;
        let booked = retry_on_transient(RetryConfig::conservative(), |_attempt| async move {
            carrier.create_shipment(request_ref).await
        })
        .await
        .into_result();

        let shipment = match booked {
            Ok(shipment) => shipment,
            Err(error) => {
                self.metrics.record_shipment("failed");
                tracing::warn!(
                    order_id = %order_id,
                    human_code = %fulfilling.human_code,
                    error = %error,
                    "Shipment booking failed; order stays FULFILLING"
                );
                return Err(error.into());
            }
        };

        let (shipped, events) = self.transition(
            &fulfilling,
            &OrderCommand::RecordShipment {
                shipment: shipment.clone(),
            },
        )?;

        match self
            .repository
            .update_if_state(&shipped, LifecycleState::Fulfilling)
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::PreconditionFailed { .. }) => {
                let current = self.load(order_id).await?;
                return self.stored_shipment(current);
            }
            Err(error) => return Err(error.into()),
        }

        self.record_events(&shipped, &events);
        self.metrics.record_shipment("booked");
        tracing::info!(
            order_id = %order_id,
            human_code = %shipped.human_code,
            tracking_code = %shipment.carrier_tracking_code,
            "Order shipped"
        );
        Ok(shipment)
    }

    fn stored_shipment(&self, order: Order) -> Result<Shipment, CheckoutError> {
        match order.shipment {
            Some(shipment) => Ok(shipment),
            None => Err(OrderError::NotPaid(order.lifecycle).into()),
        }
    }
}
