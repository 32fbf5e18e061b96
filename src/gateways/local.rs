use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::collaborators::*;
use crate::domain::order::{AddressSnapshot, CartLine, CatalogPrice};

// ============================================================================
// In-Memory Collaborators
// ============================================================================
//
// Used by the development binary and the test suites.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryCatalog {
    prices: RwLock<HashMap<String, CatalogPrice>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, product_ref: impl Into<String>, price: CatalogPrice) {
        self.prices.write().await.insert(product_ref.into(), price);
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_price(&self, product_ref: &str) -> Result<Option<CatalogPrice>, CollaboratorError> {
        Ok(self.prices.read().await.get(product_ref).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryAddressBook {
    addresses: RwLock<HashMap<(String, String), AddressSnapshot>>,
}

impl InMemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, owner_id: &str, address_ref: &str, address: AddressSnapshot) {
        self.addresses
            .write()
            .await
            .insert((owner_id.to_string(), address_ref.to_string()), address);
    }
}

#[async_trait]
impl AddressBook for InMemoryAddressBook {
    async fn get_address(
        &self,
        owner_id: &str,
        address_ref: &str,
    ) -> Result<Option<AddressSnapshot>, CollaboratorError> {
        Ok(self
            .addresses
            .read()
            .await
            .get(&(owner_id.to_string(), address_ref.to_string()))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<String, Vec<CartLine>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, owner_id: &str, lines: Vec<CartLine>) {
        self.carts.write().await.insert(owner_id.to_string(), lines);
    }

    pub async fn lines(&self, owner_id: &str) -> Vec<CartLine> {
        self.carts
            .read()
            .await
            .get(owner_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn clear(&self, owner_id: &str) -> Result<(), CollaboratorError> {
        self.carts.write().await.remove(owner_id);
        Ok(())
    }
}

/// Flat discounts keyed by promo code.
#[derive(Default)]
pub struct InMemoryPromotions {
    codes: RwLock<HashMap<String, u64>>,
}

impl InMemoryPromotions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, code: impl Into<String>, discount: u64) {
        self.codes.write().await.insert(code.into(), discount);
    }
}

#[async_trait]
impl Promotions for InMemoryPromotions {
    async fn discount_for(
        &self,
        _owner_id: &str,
        _lines: &[CartLine],
        promo_code: Option<&str>,
    ) -> Result<u64, CollaboratorError> {
        let Some(code) = promo_code else {
            return Ok(0);
        };
        self.codes
            .read()
            .await
            .get(code)
            .copied()
            .ok_or_else(|| CollaboratorError::NotFound(format!("promo code {code}")))
    }
}

/// Logs confirmations and keeps them for inspection.
#[derive(Default)]
pub struct InMemoryNotificationSender {
    sent: RwLock<Vec<OrderSummary>>,
}

impl InMemoryNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<OrderSummary> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationSender for InMemoryNotificationSender {
    async fn send_order_confirmation(&self, summary: &OrderSummary) -> Result<(), CollaboratorError> {
        tracing::info!(
            human_code = %summary.human_code,
            total = summary.total,
            items = summary.item_count,
            "Order confirmation (local outbox)"
        );
        self.sent.write().await.push(summary.clone());
        Ok(())
    }
}
