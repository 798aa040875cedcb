use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::dlq::DeadLetterQueue;
use crate::domain::order::{OrderError, OrderItem};
use crate::metrics::Metrics;
use crate::store::ProductStore;

// ============================================================================
// Inventory Ledger
// ============================================================================
//
// The only writer of product stock on the fulfillment path.
//
// - reserve: one conditional decrement in the store, never read-then-write
// - release: unconditional increment, used for compensation and cancellation
// - release_all: best-effort release of a whole reservation set; every
//   release that fails raises a consistency alarm and lands in the DLQ
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Reservations taken inside one unit of work, in the order they were made.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reservations {
    entries: Vec<Reservation>,
}

impl Reservations {
    pub fn record(&mut self, product_id: Uuid, quantity: i32) {
        self.entries.push(Reservation { product_id, quantity });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The stock an existing order holds, for release on cancellation.
    pub fn held_by(items: &[OrderItem]) -> Self {
        Self {
            entries: items
                .iter()
                .map(|item| Reservation {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub released: usize,
    pub dead_lettered: usize,
}

impl ReleaseReport {
    pub fn is_complete(&self) -> bool {
        self.dead_lettered == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedriveReport {
    pub released: usize,
    pub still_failing: usize,
}

#[derive(Clone)]
pub struct InventoryLedger {
    products: Arc<dyn ProductStore>,
    dlq: Arc<DeadLetterQueue>,
    metrics: Arc<Metrics>,
}

impl InventoryLedger {
    pub fn new(products: Arc<dyn ProductStore>, dlq: Arc<DeadLetterQueue>, metrics: Arc<Metrics>) -> Self {
        Self { products, dlq, metrics }
    }

    pub fn dead_letters(&self) -> &Arc<DeadLetterQueue> {
        &self.dlq
    }

    pub async fn reserve(&self, product_id: Uuid, quantity: i32) -> Result<(), OrderError> {
        ensure_positive(quantity)?;

        match self.products.reserve_stock(product_id, quantity).await {
            Ok(()) => {
                self.metrics.record_reservation("success");
                tracing::debug!(product_id = %product_id, quantity, "Stock reserved");
                Ok(())
            }
            Err(e) => {
                let error = OrderError::from_product_store(e);
                self.metrics.record_reservation(error.kind().as_label());
                tracing::warn!(product_id = %product_id, quantity, error = %error, "Stock reservation rejected");
                Err(error)
            }
        }
    }

    pub async fn release(&self, product_id: Uuid, quantity: i32) -> Result<(), OrderError> {
        ensure_positive(quantity)?;

        let result = self.products.release_stock(product_id, quantity).await;
        self.metrics.record_release(result.is_ok());
        result.map_err(OrderError::from_product_store)?;

        tracing::debug!(product_id = %product_id, quantity, "Stock released");
        Ok(())
    }

    /// Release every reservation, newest first. Never stops early: a failed
    /// release is alarmed and dead-lettered, and the rest still run.
    pub async fn release_all(&self, reservations: &Reservations, context: &str) -> ReleaseReport {
        let mut report = ReleaseReport::default();

        for reservation in reservations.entries.iter().rev() {
            match self.release(reservation.product_id, reservation.quantity).await {
                Ok(()) => report.released += 1,
                Err(e) => {
                    self.metrics.record_compensation_failure();
                    tracing::error!(
                        alarm = "stock_consistency",
                        product_id = %reservation.product_id,
                        quantity = reservation.quantity,
                        context = context,
                        error = %e,
                        "🚨 Compensating release failed; stock remains under-released"
                    );
                    self.dlq
                        .push(reservation.product_id, reservation.quantity, context, e.to_string())
                        .await;
                    report.dead_lettered += 1;
                }
            }
        }

        report
    }

    /// Re-attempt every dead-lettered release once. Only ever triggered by an
    /// operator; nothing retries automatically.
    pub async fn redrive_dead_letters(&self) -> RedriveReport {
        let mut report = RedriveReport::default();

        for mut entry in self.dlq.take_all().await {
            match self.release(entry.product_id, entry.quantity).await {
                Ok(()) => {
                    tracing::info!(dlq_id = %entry.id, product_id = %entry.product_id, "Dead letter redriven");
                    report.released += 1;
                }
                Err(e) => {
                    entry.failure_count += 1;
                    entry.last_failed_at = Utc::now();
                    entry.error_message = e.to_string();
                    tracing::warn!(
                        dlq_id = %entry.id,
                        failure_count = entry.failure_count,
                        error = %e,
                        "Dead letter redrive failed"
                    );
                    self.dlq.requeue(entry).await;
                    report.still_failing += 1;
                }
            }
        }

        report
    }
}

fn ensure_positive(quantity: i32) -> Result<(), OrderError> {
    if quantity <= 0 {
        return Err(OrderError::Validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
