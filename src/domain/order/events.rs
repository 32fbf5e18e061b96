use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fiscal::HumanCode;
use super::pricing::Pricing;
use super::value_objects::{LineItem, PaymentMethod, PaymentRef, Shipment};
use crate::domain::core::DomainEvent;

// ============================================================================
// Order Events - Facts emitted by the lifecycle state machine
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    CashOnDeliveryAccepted,
    PaymentRequested,
    PaymentIntentAttached(PaymentIntentAttached),
    PaymentConfirmed(PaymentConfirmed),
    PaymentRejected(PaymentRejected),
    Withdrawn(OrderWithdrawn),
    FulfillmentStarted,
    ShipmentBooked(ShipmentBooked),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::CashOnDeliveryAccepted => "OrderCashOnDeliveryAccepted",
            OrderEvent::PaymentRequested => "OrderPaymentRequested",
            OrderEvent::PaymentIntentAttached(_) => "OrderPaymentIntentAttached",
            OrderEvent::PaymentConfirmed(_) => "OrderPaymentConfirmed",
            OrderEvent::PaymentRejected(_) => "OrderPaymentRejected",
            OrderEvent::Withdrawn(_) => "OrderWithdrawn",
            OrderEvent::FulfillmentStarted => "OrderFulfillmentStarted",
            OrderEvent::ShipmentBooked(_) => "OrderShipmentBooked",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Placed - priced cart persisted under a fresh human code
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub human_code: HumanCode,
    pub owner_id: String,
    pub line_items: Vec<LineItem>,
    pub pricing: Pricing,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub address_ref: String,
    pub placed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaymentIntentAttached {
    pub intent_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaymentConfirmed {
    pub payment_ref: PaymentRef,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaymentRejected {
    pub reason: String,
}

/// Order Withdrawn - an unpaid order is about to be removed
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderWithdrawn {
    pub reason: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShipmentBooked {
    pub shipment: Shipment,
}
