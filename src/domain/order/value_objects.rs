use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Order Value Objects
// ============================================================================

/// One line of the caller's cart. The cart is an input snapshot owned by the
/// caller; the order never keeps a reference to it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_ref: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_variant: Option<String>,
}

impl CartLine {
    pub fn new(product_ref: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_ref: product_ref.into(),
            quantity,
            color_variant: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color_variant = Some(color.into());
        self
    }
}

/// A priced line frozen on the order at creation time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_ref: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_variant: Option<String>,
    pub title: String,
    /// Offer price per unit, in minor currency units.
    pub unit_price: u64,
}

impl LineItem {
    pub fn line_total(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "CASH_ON_DELIVERY",
            PaymentMethod::Online => "ONLINE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
}

/// Logistics progression, tracked separately from payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentState {
    Placed,
    Shipped,
    Delivered,
    Cancelled,
}

impl FulfillmentState {
    /// Best-effort mapping of a free-text carrier status.
    pub fn from_carrier_status(status: &str) -> Option<Self> {
        let status = status.to_ascii_lowercase();
        if status.contains("deliver") && !status.contains("undeliver") && !status.contains("out for") {
            Some(FulfillmentState::Delivered)
        } else if status.contains("cancel") || status.contains("rto") {
            Some(FulfillmentState::Cancelled)
        } else if status.contains("transit")
            || status.contains("picked")
            || status.contains("shipped")
            || status.contains("out for")
        {
            Some(FulfillmentState::Shipped)
        } else {
            None
        }
    }
}

/// States of the order lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Draft,
    AwaitingPayment,
    Paid,
    PaymentFailed,
    Fulfilling,
    Shipped,
}

impl LifecycleState {
    /// Stable column value used for conditional writes.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Draft => "DRAFT",
            LifecycleState::AwaitingPayment => "AWAITING_PAYMENT",
            LifecycleState::Paid => "PAID",
            LifecycleState::PaymentFailed => "PAYMENT_FAILED",
            LifecycleState::Fulfilling => "FULFILLING",
            LifecycleState::Shipped => "SHIPPED",
        }
    }

    /// Only unpaid online orders may be removed.
    pub fn is_deletable(&self) -> bool {
        matches!(
            self,
            LifecycleState::AwaitingPayment | LifecycleState::PaymentFailed
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway references recorded after a verified payment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRef {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

/// Carrier booking details, written in one piece once the carrier accepts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub carrier_tracking_code: String,
    pub carrier_name: String,
    pub carrier_shipment_id: String,
    pub tracking_url: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_estimate: Option<String>,
}

/// Delivery address as captured by the address collaborator.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    pub customer_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub pincode: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

// ============================================================================
// Unit Tests
// ============================================================================
