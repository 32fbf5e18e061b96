use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::fiscal::HumanCode;
use super::pricing::Pricing;
use super::value_objects::{
    FulfillmentState, LifecycleState, LineItem, PaymentMethod, PaymentRef, PaymentState, Shipment,
};
use crate::domain::core::Aggregate;

// ============================================================================
// Order Aggregate - Lifecycle State Machine
// ============================================================================
//
//   DRAFT ──cod──────────────────────────────► PAID ──► FULFILLING ──► SHIPPED
//     │                                         ▲
//     └──online──► AWAITING_PAYMENT ──verified──┘
//                        │
//                        ├──rejected──► PAYMENT_FAILED ──► (deleted)
//                        └──cancelled─────────────────────► (deleted)
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub human_code: HumanCode,
    pub owner_id: String,

    // Immutable purchase snapshot
    pub line_items: Vec<LineItem>,
    pub pricing: Pricing,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub address_ref: String,

    // Lifecycle
    pub lifecycle: LifecycleState,
    pub payment_state: PaymentState,
    pub fulfillment_state: FulfillmentState,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub payment_ref: Option<PaymentRef>,
    #[serde(default)]
    pub shipment: Option<Shipment>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order from its placement event and follow-up events.
    pub fn place(placed: OrderPlaced, then: &[OrderCommand]) -> Result<(Self, Vec<OrderEvent>), OrderError> {
        let first = OrderEvent::Placed(placed);
        let mut order = Self::apply_first_event(&first)?;
        let mut events = vec![first];

        for command in then {
            let (next, emitted) = order.execute(command)?;
            order = next;
            events.extend(emitted);
        }

        Ok((order, events))
    }

    /// `execute` stamped with the caller's clock. `updated_at` only moves
    /// when the command emitted events.
    pub fn execute_at(
        &self,
        command: &OrderCommand,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<OrderEvent>), OrderError> {
        let (mut next, events) = self.execute(command)?;
        if !events.is_empty() {
            next.updated_at = now;
        }
        Ok((next, events))
    }

    pub fn is_paid(&self) -> bool {
        self.payment_state == PaymentState::Completed
    }

    pub fn item_count(&self) -> u32 {
        self.line_items.iter().map(|item| item.quantity).sum()
    }

    fn validate_items(items: &[LineItem]) -> Result<(), OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for item in items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity(item.product_ref.clone()));
            }
        }

        Ok(())
    }

    fn invalid(&self, command: &OrderCommand) -> OrderError {
        OrderError::InvalidStatusTransition {
            state: self.lifecycle,
            action: command.name(),
        }
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Placed(e) => {
                Self::validate_items(&e.line_items)?;
                Ok(Self {
                    id: e.order_id,
                    human_code: e.human_code.clone(),
                    owner_id: e.owner_id.clone(),
                    line_items: e.line_items.clone(),
                    pricing: e.pricing,
                    currency: e.currency.clone(),
                    payment_method: e.payment_method,
                    address_ref: e.address_ref.clone(),
                    lifecycle: LifecycleState::Draft,
                    payment_state: PaymentState::Pending,
                    fulfillment_state: FulfillmentState::Placed,
                    payment_intent_id: None,
                    payment_ref: None,
                    shipment: None,
                    created_at: e.placed_at,
                    updated_at: e.placed_at,
                })
            }
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Placed(_) => {
                // First event already applied
            }
            OrderEvent::CashOnDeliveryAccepted => {
                // Collected physically on delivery; modeled as already satisfied.
                self.lifecycle = LifecycleState::Paid;
                self.payment_state = PaymentState::Completed;
            }
            OrderEvent::PaymentRequested => {
                self.lifecycle = LifecycleState::AwaitingPayment;
                self.payment_state = PaymentState::Pending;
            }
            OrderEvent::PaymentIntentAttached(e) => {
                self.payment_intent_id = Some(e.intent_id.clone());
            }
            OrderEvent::PaymentConfirmed(e) => {
                self.lifecycle = LifecycleState::Paid;
                self.payment_state = PaymentState::Completed;
                self.payment_ref = Some(e.payment_ref.clone());
            }
            OrderEvent::PaymentRejected(_) => {
                self.lifecycle = LifecycleState::PaymentFailed;
                self.payment_state = PaymentState::Failed;
            }
            OrderEvent::Withdrawn(_) => {
                self.fulfillment_state = FulfillmentState::Cancelled;
            }
            OrderEvent::FulfillmentStarted => {
                self.lifecycle = LifecycleState::Fulfilling;
            }
            OrderEvent::ShipmentBooked(e) => {
                self.lifecycle = LifecycleState::Shipped;
                self.fulfillment_state = FulfillmentState::Shipped;
                self.shipment = Some(e.shipment.clone());
            }
        }

        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        use LifecycleState::*;

        match command {
            OrderCommand::AcceptCashOnDelivery => {
                if self.lifecycle != Draft || self.payment_method != PaymentMethod::CashOnDelivery {
                    return Err(self.invalid(command));
                }
                Ok(vec![OrderEvent::CashOnDeliveryAccepted])
            }

            OrderCommand::RequestPayment => {
                if self.lifecycle != Draft || self.payment_method != PaymentMethod::Online {
                    return Err(self.invalid(command));
                }
                Ok(vec![OrderEvent::PaymentRequested])
            }

            OrderCommand::AttachPaymentIntent { intent_id } => {
                if self.lifecycle != AwaitingPayment {
                    return Err(OrderError::NotAwaitingPayment(self.lifecycle));
                }
                match &self.payment_intent_id {
                    Some(existing) if existing == intent_id => Ok(vec![]),
                    Some(_) => Err(self.invalid(command)),
                    None => Ok(vec![OrderEvent::PaymentIntentAttached(PaymentIntentAttached {
                        intent_id: intent_id.clone(),
                    })]),
                }
            }

            OrderCommand::ConfirmPayment { payment_ref } => match self.lifecycle {
                AwaitingPayment => Ok(vec![OrderEvent::PaymentConfirmed(PaymentConfirmed {
                    payment_ref: payment_ref.clone(),
                })]),
                Paid | Fulfilling | Shipped => Err(OrderError::AlreadyPaid),
                Draft | PaymentFailed => Err(OrderError::NotAwaitingPayment(self.lifecycle)),
            },

            OrderCommand::RejectPayment { reason } => match self.lifecycle {
                AwaitingPayment => Ok(vec![OrderEvent::PaymentRejected(PaymentRejected {
                    reason: reason.clone(),
                })]),
                Paid | Fulfilling | Shipped => Err(OrderError::AlreadyPaid),
                Draft | PaymentFailed => Err(OrderError::NotAwaitingPayment(self.lifecycle)),
            },

            OrderCommand::CancelPending { reason } => {
                if !self.lifecycle.is_deletable() || self.is_paid() {
                    return Err(OrderError::NotCancellable(self.lifecycle));
                }
                Ok(vec![OrderEvent::Withdrawn(OrderWithdrawn {
                    reason: reason.clone(),
                })])
            }

            OrderCommand::StartFulfillment => match self.lifecycle {
                Paid => Ok(vec![OrderEvent::FulfillmentStarted]),
                // A previous carrier attempt failed; retrying is allowed.
                Fulfilling => Ok(vec![]),
                _ => Err(OrderError::NotPaid(self.lifecycle)),
            },

            OrderCommand::RecordShipment { shipment } => {
                if self.lifecycle != Fulfilling {
                    return Err(self.invalid(command));
                }
                Ok(vec![OrderEvent::ShipmentBooked(ShipmentBooked {
                    shipment: shipment.clone(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
