// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry,
};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order creation outcomes and latency
// - Stock reservations and releases
// - Compensation failures and the dead letter queue
// - Order status updates
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the fulfillment core
pub struct Metrics {
    registry: Registry,

    // Order Metrics
    pub orders_created: IntCounter,
    pub orders_failed: IntCounterVec,
    pub create_order_duration: HistogramVec,
    pub order_status_updates: IntCounterVec,

    // Inventory Metrics
    pub stock_reservations: IntCounterVec,
    pub stock_releases: IntCounterVec,

    // Consistency Metrics
    pub compensation_failures: IntCounter,
    pub dlq_entries: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Metrics
        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let orders_failed = IntCounterVec::new(
            Opts::new("orders_failed_total", "Total order creations that failed"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_failed.clone()))?;

        let create_order_duration = HistogramVec::new(
            HistogramOpts::new("create_order_duration_seconds", "Order creation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(create_order_duration.clone()))?;

        let order_status_updates = IntCounterVec::new(
            Opts::new("order_status_updates_total", "Order status updates applied"),
            &["status"],
        )?;
        registry.register(Box::new(order_status_updates.clone()))?;

        // Inventory Metrics
        let stock_reservations = IntCounterVec::new(
            Opts::new("stock_reservations_total", "Stock reservation attempts"),
            &["outcome"],
        )?;
        registry.register(Box::new(stock_reservations.clone()))?;

        let stock_releases = IntCounterVec::new(
            Opts::new("stock_releases_total", "Stock release attempts"),
            &["outcome"],
        )?;
        registry.register(Box::new(stock_releases.clone()))?;

        // Consistency Metrics
        let compensation_failures = IntCounter::new(
            "compensation_failures_total",
            "Stock releases that could not be applied during compensation",
        )?;
        registry.register(Box::new(compensation_failures.clone()))?;

        let dlq_entries = IntGauge::new(
            "dlq_entries",
            "Unreleased reservations waiting in the dead letter queue",
        )?;
        registry.register(Box::new(dlq_entries.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            orders_failed,
            create_order_duration,
            order_status_updates,
            stock_reservations,
            stock_releases,
            compensation_failures,
            dlq_entries,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record the outcome of a create-order call
    pub fn record_order_outcome(&self, failure_reason: Option<&str>, duration_secs: f64) {
        match failure_reason {
            None => {
                self.orders_created.inc();
                self.create_order_duration.with_label_values(&["success"]).observe(duration_secs);
            }
            Some(reason) => {
                self.orders_failed.with_label_values(&[reason]).inc();
                self.create_order_duration.with_label_values(&["failure"]).observe(duration_secs);
            }
        }
    }

    /// Helper to record a reservation attempt
    pub fn record_reservation(&self, outcome: &str) {
        self.stock_reservations.with_label_values(&[outcome]).inc();
    }

    /// Helper to record a release attempt
    pub fn record_release(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.stock_releases.with_label_values(&[outcome]).inc();
    }

    /// Helper to record a compensation that could not be applied
    pub fn record_compensation_failure(&self) {
        self.compensation_failures.inc();
    }

    /// Helper to mirror the dead letter queue depth
    pub fn set_dlq_depth(&self, depth: usize) {
        self.dlq_entries.set(depth as i64);
    }

    pub fn record_status_update(&self, status: &str) {
        self.order_status_updates.with_label_values(&[status]).inc();
    }
}
