// ============================================================================
// Order Domain - Business Logic for the Order Lifecycle
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (CartLine, LineItem, LifecycleState, Shipment, ...)
// - Pricing engine (PricingEngine, Pricing)
// - Fiscal windows and human-readable codes (FiscalPolicy, HumanCode)
// - Events and commands of the lifecycle state machine
// - Errors (OrderError, PricingError, IdentifierError)
// - Aggregate (Order)
//
// No I/O happens here; services drive the aggregate.
//
// ============================================================================

pub mod value_objects;
pub mod pricing;
pub mod fiscal;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;

// Re-export for convenience
pub use value_objects::*;
pub use pricing::*;
pub use fiscal::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
