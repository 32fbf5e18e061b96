use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::repository::{OrderRepository, RepositoryError};
use crate::domain::order::{FiscalWindow, HumanCode, LifecycleState, Order};

// ============================================================================
// In-Memory Order Repository
// ============================================================================
//
// Single-process store used by tests and the development binary. One lock
// guards orders, the code index and the counters so every operation is atomic.
//
// ============================================================================

#[derive(Default)]
struct MemoryState {
    orders: HashMap<Uuid, Order>,
    codes: HashMap<HumanCode, Uuid>,
    sequences: HashMap<String, u32>,
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;

        if state.codes.contains_key(&order.human_code) {
            return Err(RepositoryError::DuplicateCode(order.human_code.clone()));
        }
        if state.orders.contains_key(&order.id) {
            return Err(RepositoryError::Backend(format!("duplicate order id {}", order.id)));
        }

        state.codes.insert(order.human_code.clone(), order.id);
        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &HumanCode) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .codes
            .get(code)
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    async fn update_if_state(
        &self,
        order: &Order,
        expected: LifecycleState,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or(RepositoryError::NotFound)?;

        if stored.lifecycle != expected {
            return Err(RepositoryError::PreconditionFailed {
                expected,
                actual: Some(stored.lifecycle.as_str().to_string()),
            });
        }

        *stored = order.clone();
        Ok(())
    }

    async fn delete_if_state(&self, id: Uuid, expected: LifecycleState) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let stored = state.orders.get(&id).ok_or(RepositoryError::NotFound)?;

        if stored.lifecycle != expected || !expected.is_deletable() || stored.is_paid() {
            return Err(RepositoryError::PreconditionFailed {
                expected,
                actual: Some(stored.lifecycle.as_str().to_string()),
            });
        }

        // The code index entry stays behind: consumed codes are never reused.
        state.orders.remove(&id);
        Ok(())
    }

    async fn max_sequence_in_window(&self, window: &FiscalWindow) -> Result<Option<u32>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .filter(|order| window.contains(order.created_at))
            .filter_map(|order| order.human_code.sequence())
            .max())
    }

    async fn increment_sequence(&self, fiscal_key: &str, floor: u32) -> Result<u32, RepositoryError> {
        let mut state = self.state.lock().await;
        let counter = state.sequences.entry(fiscal_key.to_string()).or_insert(0);
        *counter = (*counter).max(floor) + 1;
        Ok(*counter)
    }
}
