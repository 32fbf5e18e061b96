use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};
use std::time::Duration;

use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Redpanda producer could not be created: {0}")]
    Producer(String),

    #[error("Redpanda circuit open")]
    CircuitOpen,

    #[error("Redpanda delivery failed: {0}")]
    Delivery(String),
}

/// Keyed JSON publisher guarded by a circuit breaker.
pub struct RedpandaClient {
    producer: FutureProducer,
    circuit_breaker: CircuitBreaker,
}

impl RedpandaClient {
    pub fn new(brokers: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| PublishError::Producer(e.to_string()))?;

        let breaker = CircuitBreaker::new(
            "redpanda",
            CircuitBreakerConfig {
                failure_threshold: 5,
                cool_down: Duration::from_secs(30),
                success_threshold: 3,
            },
        );

        Ok(Self {
            producer,
            circuit_breaker: breaker,
        })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), PublishError> {
        let result = self
            .circuit_breaker
            .call(async {
                let record = FutureRecord::to(topic).key(key).payload(payload);
                self.producer
                    .send(record, Timeout::After(Duration::from_secs(5)))
                    .await
                    .map(|_| ())
                    .map_err(|(e, _)| PublishError::Delivery(e.to_string()))
            })
            .await;

        match result {
            Ok(()) => {
                tracing::debug!(topic = %topic, key = %key, "Published to Redpanda");
                Ok(())
            }
            Err(CircuitBreakerError::CircuitOpen(_)) => {
                tracing::warn!(topic = %topic, "Circuit breaker open - Redpanda unavailable");
                Err(PublishError::CircuitOpen)
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(error = %e, topic = %topic, "Failed to publish to Redpanda");
                Err(e)
            }
        }
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state().await
    }
}
