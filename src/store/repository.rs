use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{FiscalWindow, HumanCode, LifecycleState, Order};
use crate::utils::IsTransient;

// ============================================================================
// Order Repository - Document store contract
// ============================================================================
//
// Every mutation after creation is a compare-and-set on the lifecycle state:
// "write only if the stored order is still in `expected`". Two concurrent
// transitions on one order can therefore never both succeed.
//
// Human-code sequences are counted by the store itself, keyed by fiscal year,
// so numbering stays correct across processes.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Order not found")]
    NotFound,

    #[error("Order is in state {actual:?}, expected {expected}")]
    PreconditionFailed {
        expected: LifecycleState,
        actual: Option<String>,
    },

    #[error("Human code already taken: {0}")]
    DuplicateCode(HumanCode),

    #[error("Sequence update for {0} lost a race")]
    SequenceConflict(String),

    #[error("Corrupt order document: {0}")]
    Corrupt(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl IsTransient for RepositoryError {
    fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::SequenceConflict(_))
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Assign the persistent identifier of a new order.
    fn allocate_id(&self) -> Uuid {
        Uuid::now_v7()
    }

    /// Persist a new order. Fails with `DuplicateCode` if its human code is taken.
    async fn create(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepositoryError>;

    async fn find_by_code(&self, code: &HumanCode) -> Result<Option<Order>, RepositoryError>;

    /// Replace the stored order only if it is still in `expected`.
    async fn update_if_state(
        &self,
        order: &Order,
        expected: LifecycleState,
    ) -> Result<(), RepositoryError>;

    /// Delete the order only if it is still in `expected`, which must be an
    /// unpaid state.
    async fn delete_if_state(&self, id: Uuid, expected: LifecycleState) -> Result<(), RepositoryError>;

    /// Highest sequential code among orders created inside `window`.
    async fn max_sequence_in_window(&self, window: &FiscalWindow) -> Result<Option<u32>, RepositoryError>;

    /// Atomically advance the counter for `fiscal_key` to
    /// `max(current, floor) + 1` and return the new value.
    async fn increment_sequence(&self, fiscal_key: &str, floor: u32) -> Result<u32, RepositoryError>;
}
