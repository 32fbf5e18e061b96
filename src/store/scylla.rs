use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use scylla::statement::batch::Batch;
use scylla::value::{CqlValue, Row};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::repository::{OrderRepository, RepositoryError};
use crate::domain::order::{FiscalWindow, HumanCode, LifecycleState, Order, Pricing};

// ============================================================================
// ScyllaDB Order Repository
// ============================================================================
//
// Tables:
// - orders                 - one JSON document per order plus its state column
// - orders_by_code         - human code uniqueness (INSERT ... IF NOT EXISTS)
// - orders_by_fiscal_year  - highest code per window (clustering DESC)
// - order_sequences        - per-fiscal-year counter advanced with CAS
//
// Every conditional write is a lightweight transaction; the `[applied]`
// column of its result decides success.
//
// ============================================================================

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        id uuid PRIMARY KEY,
        human_code text,
        state text,
        document text,
        created_at timestamp
    )",
    "CREATE TABLE IF NOT EXISTS orders_by_code (
        human_code text PRIMARY KEY,
        order_id uuid
    )",
    "CREATE TABLE IF NOT EXISTS orders_by_fiscal_year (
        fiscal_year text,
        human_code text,
        order_id uuid,
        created_at timestamp,
        PRIMARY KEY (fiscal_year, human_code)
    ) WITH CLUSTERING ORDER BY (human_code DESC)",
    "CREATE TABLE IF NOT EXISTS order_sequences (
        fiscal_year text PRIMARY KEY,
        last_value int
    )",
];

fn backend<E: std::fmt::Display>(error: E) -> RepositoryError {
    RepositoryError::Backend(error.to_string())
}

fn corrupt<E: std::fmt::Display>(error: E) -> RepositoryError {
    RepositoryError::Corrupt(error.to_string())
}

/// Outcome of a lightweight transaction: `[applied]` plus the first
/// condition column, if the server returned one.
struct LwtOutcome {
    applied: bool,
    existing: Option<CqlValue>,
}

fn lwt_outcome(result: QueryResult) -> Result<LwtOutcome, RepositoryError> {
    let rows = result.into_rows_result().map_err(backend)?;
    let row = rows
        .maybe_first_row::<Row>()
        .map_err(backend)?
        .ok_or_else(|| RepositoryError::Backend("empty lightweight transaction result".into()))?;

    let mut columns = row.columns.into_iter();
    let applied = matches!(columns.next(), Some(Some(CqlValue::Boolean(true))));
    let existing = columns.next().flatten();

    Ok(LwtOutcome { applied, existing })
}

fn precondition_error(expected: LifecycleState, existing: Option<CqlValue>) -> RepositoryError {
    match existing {
        Some(CqlValue::Text(actual)) | Some(CqlValue::Ascii(actual)) => {
            RepositoryError::PreconditionFailed {
                expected,
                actual: Some(actual),
            }
        }
        _ => RepositoryError::NotFound,
    }
}

/// Decode a stored order document.
///
/// Documents written before pricing breakdowns were stored only carry the
/// charged `amount`; the breakdown is rebuilt from it on read. A stored
/// breakdown always wins.
pub(crate) fn decode_document(raw: &str, tax_rate_bps: u32) -> Result<Order, RepositoryError> {
    let mut value: Value = serde_json::from_str(raw).map_err(corrupt)?;

    if let Some(document) = value.as_object_mut() {
        if !document.contains_key("pricing") {
            if let Some(amount) = document.get("amount").and_then(Value::as_u64) {
                tracing::debug!(amount, "Rebuilding pricing breakdown for legacy order document");
                let pricing = Pricing::reconstruct_from_amount(amount, tax_rate_bps);
                document.insert("pricing".to_string(), serde_json::to_value(pricing).map_err(corrupt)?);
            }
        }
    }

    serde_json::from_value(value).map_err(corrupt)
}

pub struct ScyllaOrderRepository {
    session: Arc<Session>,
    tax_rate_bps: u32,
}

impl ScyllaOrderRepository {
    pub fn new(session: Arc<Session>, tax_rate_bps: u32) -> Self {
        Self {
            session,
            tax_rate_bps,
        }
    }

    /// Connect, ensure the keyspace and tables exist, and bound every request
    /// with `request_timeout`.
    pub async fn connect(
        nodes: &[String],
        keyspace: &str,
        request_timeout: Duration,
        tax_rate_bps: u32,
    ) -> Result<Self, RepositoryError> {
        let profile = ExecutionProfile::builder()
            .request_timeout(Some(request_timeout))
            .build()
            .into_handle();

        let session: Session = SessionBuilder::new()
            .known_nodes(nodes)
            .default_execution_profile_handle(profile)
            .build()
            .await
            .map_err(backend)?;

        session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH REPLICATION = \
                     {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
                ),
                &[],
            )
            .await
            .map_err(backend)?;
        session.use_keyspace(keyspace, false).await.map_err(backend)?;

        let repository = Self::new(Arc::new(session), tax_rate_bps);
        repository.migrate().await?;

        tracing::info!(keyspace = %keyspace, "Connected order repository to ScyllaDB");
        Ok(repository)
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            self.session
                .query_unpaged(*statement, &[])
                .await
                .map_err(backend)?;
        }
        Ok(())
    }

    async fn current_sequence(&self, fiscal_key: &str) -> Result<Option<i32>, RepositoryError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT last_value FROM order_sequences WHERE fiscal_year = ?",
                (fiscal_key,),
            )
            .await
            .map_err(backend)?;

        let rows = result.into_rows_result().map_err(backend)?;
        let row = rows.maybe_first_row::<(Option<i32>,)>().map_err(backend)?;
        Ok(row.and_then(|(value,)| value))
    }
}

#[async_trait]
impl OrderRepository for ScyllaOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let code = order.human_code.as_str().to_string();

        let claimed = self
            .session
            .query_unpaged(
                "INSERT INTO orders_by_code (human_code, order_id) VALUES (?, ?) IF NOT EXISTS",
                (code.clone(), order.id),
            )
            .await
            .map_err(backend)?;
        if !lwt_outcome(claimed)?.applied {
            return Err(RepositoryError::DuplicateCode(order.human_code.clone()));
        }

        let document = serde_json::to_string(order).map_err(corrupt)?;
        let state = order.lifecycle.as_str().to_string();
        let created_at: DateTime<Utc> = order.created_at;
        let insert_order =
            "INSERT INTO orders (id, human_code, state, document, created_at) VALUES (?, ?, ?, ?, ?)";

        if order.human_code.is_fallback() {
            self.session
                .query_unpaged(insert_order, (order.id, code, state, document, created_at))
                .await
                .map_err(backend)?;
        } else {
            let mut batch = Batch::default();
            batch.append_statement(insert_order);
            batch.append_statement(
                "INSERT INTO orders_by_fiscal_year (fiscal_year, human_code, order_id, created_at) \
                 VALUES (?, ?, ?, ?)",
            );

            let fiscal_year = order.human_code.fiscal_label().to_string();
            self.session
                .batch(
                    &batch,
                    (
                        (order.id, code.clone(), state, document, created_at),
                        (fiscal_year, code, order.id, created_at),
                    ),
                )
                .await
                .map_err(backend)?;
        }

        tracing::info!(
            order_id = %order.id,
            human_code = %order.human_code,
            state = %order.lifecycle,
            "Persisted order document"
        );

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        let result = self
            .session
            .query_unpaged("SELECT document FROM orders WHERE id = ?", (id,))
            .await
            .map_err(backend)?;

        let rows = result.into_rows_result().map_err(backend)?;
        match rows.maybe_first_row::<(String,)>().map_err(backend)? {
            Some((document,)) => decode_document(&document, self.tax_rate_bps).map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_code(&self, code: &HumanCode) -> Result<Option<Order>, RepositoryError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT order_id FROM orders_by_code WHERE human_code = ?",
                (code.as_str(),),
            )
            .await
            .map_err(backend)?;

        let rows = result.into_rows_result().map_err(backend)?;
        match rows.maybe_first_row::<(Uuid,)>().map_err(backend)? {
            Some((order_id,)) => self.get(order_id).await,
            None => Ok(None),
        }
    }

    async fn update_if_state(
        &self,
        order: &Order,
        expected: LifecycleState,
    ) -> Result<(), RepositoryError> {
        let document = serde_json::to_string(order).map_err(corrupt)?;

        let result = self
            .session
            .query_unpaged(
                "UPDATE orders SET state = ?, document = ? WHERE id = ? IF state = ?",
                (order.lifecycle.as_str(), document, order.id, expected.as_str()),
            )
            .await
            .map_err(backend)?;

        let outcome = lwt_outcome(result)?;
        if !outcome.applied {
            return Err(precondition_error(expected, outcome.existing));
        }

        tracing::debug!(
            order_id = %order.id,
            from = %expected,
            to = %order.lifecycle,
            "Conditionally updated order"
        );
        Ok(())
    }

    async fn delete_if_state(&self, id: Uuid, expected: LifecycleState) -> Result<(), RepositoryError> {
        if !expected.is_deletable() {
            return Err(RepositoryError::PreconditionFailed {
                expected,
                actual: None,
            });
        }

        let result = self
            .session
            .query_unpaged(
                "DELETE FROM orders WHERE id = ? IF state = ?",
                (id, expected.as_str()),
            )
            .await
            .map_err(backend)?;

        let outcome = lwt_outcome(result)?;
        if !outcome.applied {
            return Err(precondition_error(expected, outcome.existing));
        }

        tracing::info!(order_id = %id, state = %expected, "Deleted unpaid order");
        Ok(())
    }

    async fn max_sequence_in_window(&self, window: &FiscalWindow) -> Result<Option<u32>, RepositoryError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT human_code FROM orders_by_fiscal_year WHERE fiscal_year = ? LIMIT 1",
                (window.label(),),
            )
            .await
            .map_err(backend)?;

        let rows = result.into_rows_result().map_err(backend)?;
        Ok(rows
            .maybe_first_row::<(String,)>()
            .map_err(backend)?
            .and_then(|(code,)| HumanCode::parse(&code))
            .and_then(|code| code.sequence()))
    }

    async fn increment_sequence(&self, fiscal_key: &str, floor: u32) -> Result<u32, RepositoryError> {
        let floor = i32::try_from(floor).map_err(backend)?;

        let (next, result) = match self.current_sequence(fiscal_key).await? {
            None => {
                let next = floor + 1;
                let result = self
                    .session
                    .query_unpaged(
                        "INSERT INTO order_sequences (fiscal_year, last_value) VALUES (?, ?) IF NOT EXISTS",
                        (fiscal_key, next),
                    )
                    .await
                    .map_err(backend)?;
                (next, result)
            }
            Some(current) => {
                let next = current.max(floor) + 1;
                let result = self
                    .session
                    .query_unpaged(
                        "UPDATE order_sequences SET last_value = ? WHERE fiscal_year = ? IF last_value = ?",
                        (next, fiscal_key, current),
                    )
                    .await
                    .map_err(backend)?;
                (next, result)
            }
        };

        if !lwt_outcome(result)?.applied {
            return Err(RepositoryError::SequenceConflict(fiscal_key.to_string()));
        }

        u32::try_from(next).map_err(backend)
    }
}
