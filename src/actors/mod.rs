// ============================================================================
// Actors Module
// ============================================================================
//
// Background work that must never block or fail a request. Order state
// itself is driven by services, not actors.
//
// ============================================================================

mod notification;

pub use notification::{NotificationQueue, NotificationWorker, SendConfirmation};
