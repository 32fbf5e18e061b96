use actix_web::{App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_orders::actors::NotificationQueue;
use storefront_orders::api::{self, AppState};
use storefront_orders::config::AppConfig;
use storefront_orders::gateways::{
    HttpCarrierClient, HttpPaymentGateway, InMemoryAddressBook, InMemoryCartStore, InMemoryCatalog,
    InMemoryNotificationSender, InMemoryPromotions, NotificationSender, ShippingCarrier,
};
use storefront_orders::messaging::{RedpandaClient, RedpandaNotificationSender};
use storefront_orders::metrics::Metrics;
use storefront_orders::services::{Collaborators, OrderCodeGenerator, OrderLifecycle, TrackingService};
use storefront_orders::store::{InMemoryOrderRepository, OrderRepository, ScyllaOrderRepository};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront_orders=debug")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(?config, "Starting storefront order service");

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // === 2. Order store ===
    let repository: Arc<dyn OrderRepository> = match &config.scylla {
        Some(scylla) => {
            tracing::info!(nodes = ?scylla.nodes, "Connecting to ScyllaDB...");
            Arc::new(
                ScyllaOrderRepository::connect(
                    &scylla.nodes,
                    &scylla.keyspace,
                    scylla.request_timeout,
                    config.pricing.tax_rate_bps,
                )
                .await?,
            )
        }
        None => {
            tracing::warn!("SCYLLA_NODES not set; orders are kept in memory");
            Arc::new(InMemoryOrderRepository::new())
        }
    };

    // === 3. Notifications ===
    let sender: Arc<dyn NotificationSender> = match &config.notifications.brokers {
        Some(brokers) => Arc::new(RedpandaNotificationSender::new(
            RedpandaClient::new(brokers)?,
            config.notifications.topic.clone(),
        )),
        None => {
            tracing::warn!("REDPANDA_BROKERS not set; confirmations go to the local outbox");
            Arc::new(InMemoryNotificationSender::new())
        }
    };
    let notifications = NotificationQueue::spawn(sender, metrics.clone());

    // === 4. Gateways and collaborators ===
    let carrier: Arc<dyn ShippingCarrier> =
        Arc::new(HttpCarrierClient::new(config.carrier.clone(), metrics.clone())?);

    let collaborators = Collaborators {
        catalog: Arc::new(InMemoryCatalog::new()),
        addresses: Arc::new(InMemoryAddressBook::new()),
        carts: Arc::new(InMemoryCartStore::new()),
        promotions: Arc::new(InMemoryPromotions::new()),
        payments: Arc::new(HttpPaymentGateway::new(config.payment.clone(), metrics.clone())?),
        carrier: carrier.clone(),
        notifications,
    };

    // === 5. Services ===
    let codes = OrderCodeGenerator::new(
        repository.clone(),
        config.numbering.policy()?,
        config.numbering.sequence_retry_attempts,
        metrics.clone(),
    );
    let lifecycle = OrderLifecycle::new(
        repository.clone(),
        collaborators,
        config.pricing.engine(),
        config.pricing.currency.clone(),
        codes,
        metrics.clone(),
    );
    let state = Arc::new(AppState {
        lifecycle,
        tracking: TrackingService::new(repository, carrier),
    });

    // === 6. HTTP ===
    tracing::info!(port = config.http_port, "Serving order API on http://0.0.0.0:{}", config.http_port);
    HttpServer::new(move || App::new().configure(api::app_data(state.clone(), metrics.clone())))
        .bind(("0.0.0.0", config.http_port))?
        .run()
        .await?;

    Ok(())
}
