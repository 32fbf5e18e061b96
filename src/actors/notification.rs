use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::Actor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::gateways::{NotificationSender, OrderSummary};
use crate::metrics::Metrics;

// ============================================================================
// Notification Worker - Best-effort order confirmations
// ============================================================================
//
// Confirmations are queued to this actor once an order reaches PAID. The
// caller never awaits delivery; a failed or slow send is logged, counted and
// dropped. It never touches the order.
//
// ============================================================================

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Messages
// ============================================================================

pub struct SendConfirmation(pub OrderSummary);

// ============================================================================
// Notification Worker Actor
// ============================================================================

pub struct NotificationWorker {
    sender: Arc<dyn NotificationSender>,
    metrics: Arc<Metrics>,
}

impl NotificationWorker {
    pub fn new(sender: Arc<dyn NotificationSender>, metrics: Arc<Metrics>) -> Self {
        Self { sender, metrics }
    }
}

impl Actor for NotificationWorker {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!("NotificationWorker started");
        Ok(state)
    }
}

impl Message<SendConfirmation> for NotificationWorker {
    type Reply = ();

    async fn handle(
        &mut self,
        SendConfirmation(summary): SendConfirmation,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let started = Instant::now();
        let outcome = tokio::time::timeout(SEND_TIMEOUT, self.sender.send_order_confirmation(&summary)).await;
        self.metrics.observe_external("notification", started);

        match outcome {
            Ok(Ok(())) => {
                self.metrics.record_notification("sent");
                tracing::info!(human_code = %summary.human_code, "Order confirmation sent");
            }
            Ok(Err(error)) => {
                self.metrics.record_notification("failed");
                tracing::warn!(
                    human_code = %summary.human_code,
                    error = %error,
                    "Order confirmation failed; dropping"
                );
            }
            Err(_) => {
                self.metrics.record_notification("timeout");
                tracing::warn!(human_code = %summary.human_code, "Order confirmation timed out; dropping");
            }
        }
    }
}

/// Handle the orchestrator uses to submit confirmations.
#[derive(Clone)]
pub struct NotificationQueue {
    worker: ActorRef<NotificationWorker>,
    metrics: Arc<Metrics>,
}

impl NotificationQueue {
    pub fn spawn(sender: Arc<dyn NotificationSender>, metrics: Arc<Metrics>) -> Self {
        let worker = NotificationWorker::spawn(NotificationWorker::new(sender, metrics.clone()));
        Self { worker, metrics }
    }

    /// Queue a confirmation without waiting. A full mailbox drops it.
    pub fn submit(&self, summary: OrderSummary) {
        let human_code = summary.human_code.clone();
        if let Err(error) = self.worker.tell(SendConfirmation(summary)).try_send() {
            self.metrics.record_notification("dropped");
            tracing::warn!(human_code = %human_code, error = %error, "Notification not queued; dropping");
        }
    }
}
