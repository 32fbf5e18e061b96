use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::order::{AddressSnapshot, CartLine, CatalogPrice, Order};

// ============================================================================
// Collaborator Contracts
// ============================================================================
//
// Services owned elsewhere that the order lifecycle consumes. Each is shared
// as `Arc<dyn Trait>`; in-memory versions live in `gateways::local`.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Current authoritative price, `None` for an unknown product.
    async fn get_price(&self, product_ref: &str) -> Result<Option<CatalogPrice>, CollaboratorError>;
}

#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Address `address_ref` if it belongs to `owner_id`.
    async fn get_address(
        &self,
        owner_id: &str,
        address_ref: &str,
    ) -> Result<Option<AddressSnapshot>, CollaboratorError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn clear(&self, owner_id: &str) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait Promotions: Send + Sync {
    /// Discount in minor units for this cart; zero when nothing applies.
    async fn discount_for(
        &self,
        owner_id: &str,
        lines: &[CartLine],
        promo_code: Option<&str>,
    ) -> Result<u64, CollaboratorError>;
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_order_confirmation(&self, summary: &OrderSummary) -> Result<(), CollaboratorError>;
}

/// Payload of the order-confirmation notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub human_code: String,
    pub owner_id: String,
    pub email: String,
    pub customer_name: String,
    pub total: u64,
    pub currency: String,
    pub item_count: u32,
}

impl OrderSummary {
    pub fn new(order: &Order, address: &AddressSnapshot) -> Self {
        Self {
            human_code: order.human_code.as_str().to_string(),
            owner_id: order.owner_id.clone(),
            email: address.email.clone(),
            customer_name: address.customer_name.clone(),
            total: order.pricing.total(),
            currency: order.currency.clone(),
            item_count: order.item_count(),
        }
    }
}
