// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Pure state machines and calculations. Collaborators (stores, gateways,
// carriers) live outside this layer and are driven by `services`.
//
// ============================================================================

pub mod core;
pub mod order;

pub use self::core::{Aggregate, DomainEvent};
