pub mod notifications;
pub mod redpanda;

pub use notifications::RedpandaNotificationSender;
pub use redpanda::{PublishError, RedpandaClient};
