use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::order::{FiscalPolicy, HumanCode, IdentifierError};
use crate::metrics::Metrics;
use crate::store::{OrderRepository, RepositoryError};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Order Code Generator
// ============================================================================
//
// Codes look like `25-26/W/0042`: fiscal year, sales channel, and a
// zero-padded sequence that restarts every fiscal year.
//
// The sequence comes from the store's per-fiscal-year counter, floored by the
// highest code already stored in the window. Lost counter races are retried;
// any other store failure yields an audited `FB-` fallback code instead of
// blocking the checkout.
//
// ============================================================================

const FALLBACK_TOKEN_LEN: usize = 8;

pub struct OrderCodeGenerator {
    repository: Arc<dyn OrderRepository>,
    policy: FiscalPolicy,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
}

impl OrderCodeGenerator {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        policy: FiscalPolicy,
        sequence_retry_attempts: u32,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repository,
            policy,
            retry: RetryConfig::contention(sequence_retry_attempts),
            metrics,
        }
    }

    /// Next human code for an order created at `now`.
    pub async fn next_code(&self, now: DateTime<Utc>) -> Result<HumanCode, IdentifierError> {
        let window = self.policy.window(now)?;
        let fiscal_key = window.label();

        let repository = &self.repository;
        let (window_ref, key) = (&window, fiscal_key.as_str());

        let sequence = retry_on_transient(self.retry.clone(), |_attempt| async move {
            let floor = repository.max_sequence_in_window(window_ref).await?.unwrap_or(0);
            repository.increment_sequence(key, floor).await
        })
        .await
        .into_result();

        match sequence {
            Ok(sequence) => {
                let code = HumanCode::sequential(&window, self.policy.channel(), sequence)?;
                tracing::debug!(human_code = %code, "Allocated order code");
                Ok(code)
            }
            Err(RepositoryError::SequenceConflict(_)) => {
                tracing::warn!(fiscal_year = %fiscal_key, "Order sequence still contended after retries");
                Err(IdentifierError::SequenceConflict)
            }
            Err(error) => {
                let token = Uuid::new_v4().simple().to_string()[..FALLBACK_TOKEN_LEN].to_ascii_uppercase();
                let code = HumanCode::fallback(&window, self.policy.channel(), &token);

                self.metrics.order_code_fallback.inc();
                tracing::warn!(
                    audit = true,
                    human_code = %code,
                    fiscal_year = %fiscal_key,
                    error = %error,
                    "Order sequence unavailable; issued non-sequential fallback code"
                );
                Ok(code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{FiscalWindow, LifecycleState, Order};
    use crate::store::InMemoryOrderRepository;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails every counter update with a fixed error.
    struct FailingCounter {
        inner: InMemoryOrderRepository,
        conflict: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl OrderRepository for FailingCounter {
        async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
            self.inner.create(order).await
        }
        async fn get(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
            self.inner.get(id).await
        }
        async fn find_by_code(&self, code: &HumanCode) -> Result<Option<Order>, RepositoryError> {
            self.inner.find_by_code(code).await
        }
        async fn update_if_state(&self, order: &Order, expected: LifecycleState) -> Result<(), RepositoryError> {
            self.inner.update_if_state(order, expected).await
        }
        async fn delete_if_state(&self, id: Uuid, expected: LifecycleState) -> Result<(), RepositoryError> {
            self.inner.delete_if_state(id, expected).await
        }
        async fn max_sequence_in_window(&self, window: &FiscalWindow) -> Result<Option<u32>, RepositoryError> {
            self.inner.max_sequence_in_window(window).await
        }
        async fn increment_sequence(&self, fiscal_key: &str, _floor: u32) -> Result<u32, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.conflict {
                Err(RepositoryError::SequenceConflict(fiscal_key.to_string()))
            } else {
                Err(RepositoryError::Backend("connection reset".to_string()))
            }
        }
    }

    fn may_2025() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap()
    }

    fn generator(repository: Arc<dyn OrderRepository>, metrics: Arc<Metrics>) -> OrderCodeGenerator {
        OrderCodeGenerator::new(repository, FiscalPolicy::new(4, 330, "W").unwrap(), 3, metrics)
    }

    #[tokio::test]
    async fn test_codes_start_at_one_and_increase() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let codes = generator(Arc::new(InMemoryOrderRepository::new()), metrics);

        assert_eq!(codes.next_code(may_2025()).await.unwrap().as_str(), "25-26/W/0001");
        assert_eq!(codes.next_code(may_2025()).await.unwrap().as_str(), "25-26/W/0002");
    }

    #[tokio::test]
    async fn test_new_fiscal_year_restarts_sequence() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let codes = generator(Arc::new(InMemoryOrderRepository::new()), metrics);

        codes.next_code(may_2025()).await.unwrap();
        let april = Utc.with_ymd_and_hms(2026, 4, 2, 0, 0, 0).unwrap();
        assert_eq!(codes.next_code(april).await.unwrap().as_str(), "26-27/W/0001");
    }

    #[tokio::test]
    async fn test_exhausted_sequence_is_an_error() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let repository = Arc::new(InMemoryOrderRepository::new());
        repository.increment_sequence("25-26", 9_998).await.unwrap();
        let codes = generator(repository, metrics);

        let result = codes.next_code(may_2025()).await;
        assert!(matches!(result, Err(IdentifierError::SequenceExhausted { sequence: 10_000, .. })));
    }

    #[tokio::test]
    async fn test_persistent_conflict_surfaces_after_bounded_retries() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let repository = Arc::new(FailingCounter {
            inner: InMemoryOrderRepository::new(),
            conflict: true,
            calls: AtomicU32::new(0),
        });
        let codes = generator(repository.clone(), metrics);

        let result = codes.next_code(may_2025()).await;
        assert!(matches!(result, Err(IdentifierError::SequenceConflict)));
        assert_eq!(repository.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_backend_failure_issues_audited_fallback() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let repository = Arc::new(FailingCounter {
            inner: InMemoryOrderRepository::new(),
            conflict: false,
            calls: AtomicU32::new(0),
        });
        let codes = generator(repository.clone(), metrics.clone());

        let code = codes.next_code(may_2025()).await.unwrap();
        assert!(code.is_fallback());
        assert!(code.as_str().starts_with("25-26/W/FB-"));
        assert_eq!(metrics.order_code_fallback.get(), 1);
        assert_eq!(repository.calls.load(Ordering::SeqCst), 1);
    }
}
