pub mod actors;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateways;
pub mod messaging;
pub mod metrics;
pub mod services;
pub mod store;
pub mod utils;

pub use error::CheckoutError;
