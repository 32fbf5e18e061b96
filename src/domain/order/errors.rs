use super::value_objects::LifecycleState;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order is already paid")]
    AlreadyPaid,

    #[error("Order is not awaiting payment (state {0})")]
    NotAwaitingPayment(LifecycleState),

    #[error("Order cannot be cancelled in state {0}")]
    NotCancellable(LifecycleState),

    #[error("Order must be paid before shipping (state {0})")]
    NotPaid(LifecycleState),

    #[error("Cannot {action} an order in state {state}")]
    InvalidStatusTransition {
        state: LifecycleState,
        action: &'static str,
    },

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item quantity for {0}")]
    InvalidQuantity(String),

    #[error("Aggregate not initialized")]
    NotInitialized,
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity for product {0}")]
    InvalidQuantity(String),

    #[error("Unknown product {0}")]
    InvalidLineItem(String),

    #[error("Discount {discount} exceeds subtotal plus tax {limit}")]
    DiscountTooLarge { discount: u64, limit: u64 },

    #[error("Total {supplied} does not match computed total {expected}")]
    TotalMismatch { expected: u64, supplied: u64 },

    #[error("Amount overflow")]
    Overflow,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    #[error("Order sequence exhausted for fiscal year {fiscal_year} at {sequence}")]
    SequenceExhausted { fiscal_year: String, sequence: u32 },

    #[error("Order sequence update lost a race")]
    SequenceConflict,

    #[error("Invalid fiscal policy: {0}")]
    InvalidPolicy(String),
}
