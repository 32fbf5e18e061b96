use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::order::{HumanCode, Order, Shipment};
use crate::error::CheckoutError;
use crate::gateways::{ShippingCarrier, TrackingSnapshot};
use crate::store::OrderRepository;

/// Stored order and shipment merged with the carrier's live view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub order: Order,
    pub shipment: Option<Shipment>,
    /// `None` when there is nothing to track yet or the carrier is unreachable.
    pub real_time_tracking: Option<TrackingSnapshot>,
}

pub enum OrderLookup {
    Id(Uuid),
    Code(HumanCode),
}

/// Read-only tracking; carrier failures degrade to the stored snapshot.
pub struct TrackingService {
    repository: Arc<dyn OrderRepository>,
    carrier: Arc<dyn ShippingCarrier>,
}

impl TrackingService {
    pub fn new(repository: Arc<dyn OrderRepository>, carrier: Arc<dyn ShippingCarrier>) -> Self {
        Self { repository, carrier }
    }

    pub async fn track(&self, owner_id: &str, lookup: OrderLookup) -> Result<TrackingView, CheckoutError> {
        let order = match lookup {
            OrderLookup::Id(id) => self.repository.get(id).await?,
            OrderLookup::Code(code) => self.repository.find_by_code(&code).await?,
        }
        .ok_or(CheckoutError::NotFound("Order"))?;

        if order.owner_id != owner_id {
            return Err(CheckoutError::Unauthorized);
        }

        let real_time_tracking = match &order.shipment {
            Some(shipment) if !shipment.carrier_tracking_code.is_empty() => {
                match self.carrier.track(&shipment.carrier_tracking_code).await {
                    Ok(snapshot) => Some(snapshot),
                    Err(error) => {
                        tracing::warn!(
                            order_id = %order.id,
                            tracking_code = %shipment.carrier_tracking_code,
                            error = %error,
                            "Live tracking unavailable; returning stored shipment"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(TrackingView {
            shipment: order.shipment.clone(),
            order,
            real_time_tracking,
        })
    }
}
