pub mod identifier;
pub mod orchestrator;
pub mod tracking;

pub use identifier::OrderCodeGenerator;
pub use orchestrator::{
    Caller, Clock, Collaborators, CreateOrderRequest, CreatedOrder, OrderLifecycle, VerifyPaymentRequest,
};
pub use tracking::{OrderLookup, TrackingService, TrackingView};
