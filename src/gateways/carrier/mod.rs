mod client;
mod request;
mod response;
mod token;

use async_trait::async_trait;

use crate::domain::order::Shipment;
use crate::utils::IsTransient;

pub use client::HttpCarrierClient;
pub use request::{ShipmentItem, ShipmentRequest};
pub use response::{TrackingActivity, TrackingSnapshot};
pub use token::TokenCache;

#[derive(Debug, thiserror::Error)]
pub enum CarrierError {
    #[error("Carrier credentials are not configured")]
    MissingCredentials,

    #[error("Shipment request is missing required fields: {}", .missing.join(", "))]
    IncompleteShipmentRequest { missing: Vec<&'static str> },

    #[error("Carrier rejected the credentials")]
    Unauthorized,

    #[error("Carrier rejected the request with status {status}")]
    Rejected { status: u16, body: String },

    #[error("Carrier unavailable: {0}")]
    Unavailable(String),

    #[error("Unrecognized carrier response: {0}")]
    UnrecognizedCarrierResponse(String),

    #[error("Tracking unavailable: {0}")]
    TrackingUnavailable(String),
}

impl IsTransient for CarrierError {
    fn is_transient(&self) -> bool {
        matches!(self, CarrierError::Unavailable(_))
    }
}

/// Shipping carrier as seen by the orchestrator and the tracking view.
#[async_trait]
pub trait ShippingCarrier: Send + Sync {
    /// Book a shipment. Fails fast with `IncompleteShipmentRequest` before any
    /// network call when required fields are blank.
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, CarrierError>;

    async fn track(&self, tracking_code: &str) -> Result<TrackingSnapshot, CarrierError>;
}
