// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use std::time::Instant;

pub use server::{health_handler, metrics_handler};

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// Provides metrics for:
// - Order creation by payment method
// - Payment verification outcomes and compensations
// - Carrier bookings and token refreshes
// - Best-effort notification delivery
// - Fallback order codes (each one breaks sequential numbering)
// - Latency of every external call
//
// All metrics are registered with one Registry and scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounterVec,
    pub payment_verifications: IntCounterVec,
    pub orders_compensated: IntCounterVec,
    pub shipments: IntCounterVec,
    pub carrier_token_refresh: IntCounter,
    pub notifications: IntCounterVec,
    pub order_code_fallback: IntCounter,
    pub external_call_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounterVec::new(
            Opts::new("orders_created_total", "Orders persisted"),
            &["payment_method"],
        )?;
        registry.register(Box::new(orders_created.clone()))?;

        let payment_verifications = IntCounterVec::new(
            Opts::new("payment_verifications_total", "Payment verification attempts"),
            &["outcome"],
        )?;
        registry.register(Box::new(payment_verifications.clone()))?;

        let orders_compensated = IntCounterVec::new(
            Opts::new("orders_compensated_total", "Pending orders removed by compensation"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_compensated.clone()))?;

        let shipments = IntCounterVec::new(
            Opts::new("shipments_total", "Carrier shipment requests"),
            &["outcome"],
        )?;
        registry.register(Box::new(shipments.clone()))?;

        let carrier_token_refresh = IntCounter::new(
            "carrier_token_refresh_total",
            "Carrier authentications performed",
        )?;
        registry.register(Box::new(carrier_token_refresh.clone()))?;

        let notifications = IntCounterVec::new(
            Opts::new("notifications_total", "Order confirmation notifications"),
            &["outcome"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        let order_code_fallback = IntCounter::new(
            "order_code_fallback_total",
            "Orders that received a non-sequential fallback code",
        )?;
        registry.register(Box::new(order_code_fallback.clone()))?;

        let external_call_duration = HistogramVec::new(
            HistogramOpts::new("external_call_duration_seconds", "External call latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0]),
            &["target"],
        )?;
        registry.register(Box::new(external_call_duration.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            payment_verifications,
            orders_compensated,
            shipments,
            carrier_token_refresh,
            notifications,
            order_code_fallback,
            external_call_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self, payment_method: &str) {
        self.orders_created.with_label_values(&[payment_method]).inc();
    }

    pub fn record_verification(&self, outcome: &str) {
        self.payment_verifications.with_label_values(&[outcome]).inc();
    }

    pub fn record_compensation(&self, reason: &str) {
        self.orders_compensated.with_label_values(&[reason]).inc();
    }

    pub fn record_shipment(&self, outcome: &str) {
        self.shipments.with_label_values(&[outcome]).inc();
    }

    pub fn record_notification(&self, outcome: &str) {
        self.notifications.with_label_values(&[outcome]).inc();
    }

    pub fn observe_external(&self, target: &str, started: Instant) {
        self.external_call_duration
            .with_label_values(&[target])
            .observe(started.elapsed().as_secs_f64());
    }
}
