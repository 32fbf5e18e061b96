use super::value_objects::{PaymentRef, Shipment};

// ============================================================================
// Order Commands - Represent lifecycle intent
// ============================================================================
//
// Placement is not a command: a new order starts from `OrderEvent::Placed`.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    AcceptCashOnDelivery,
    RequestPayment,
    AttachPaymentIntent {
        intent_id: String,
    },
    ConfirmPayment {
        payment_ref: PaymentRef,
    },
    RejectPayment {
        reason: String,
    },
    CancelPending {
        reason: String,
    },
    StartFulfillment,
    RecordShipment {
        shipment: Shipment,
    },
}

impl OrderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::AcceptCashOnDelivery => "accept cash on delivery for",
            OrderCommand::RequestPayment => "request payment for",
            OrderCommand::AttachPaymentIntent { .. } => "attach a payment intent to",
            OrderCommand::ConfirmPayment { .. } => "confirm payment for",
            OrderCommand::RejectPayment { .. } => "reject payment for",
            OrderCommand::CancelPending { .. } => "cancel",
            OrderCommand::StartFulfillment => "start fulfillment for",
            OrderCommand::RecordShipment { .. } => "record a shipment for",
        }
    }
}
