use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::metrics::Metrics;

// ============================================================================
// Dead Letter Queue - Unreleased Reservations
// ============================================================================
//
// Holds stock releases that failed during compensation or cancellation.
// Each entry is stock that is still subtracted from a product although no
// live order owns it. Provides:
// - In-process storage of failed releases
// - Queryable for manual intervention
// - Depth mirrored into metrics
// - Redrive on operator request (see InventoryLedger::redrive_dead_letters)
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetter {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// What the release was compensating, e.g. "create_order user=alice".
    pub context: String,
    pub error_message: String,
    pub failure_count: u32,
    pub first_failed_at: DateTime<Utc>,
    pub last_failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DlqStats {
    pub total_entries: usize,
    pub unreleased_by_product: HashMap<Uuid, i64>,
}

pub struct DeadLetterQueue {
    entries: Mutex<Vec<DeadLetter>>,
    metrics: Arc<Metrics>,
}

impl DeadLetterQueue {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            metrics,
        }
    }

    pub async fn push(
        &self,
        product_id: Uuid,
        quantity: i32,
        context: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Uuid {
        let now = Utc::now();
        let entry = DeadLetter {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            context: context.into(),
            error_message: error_message.into(),
            failure_count: 1,
            first_failed_at: now,
            last_failed_at: now,
        };

        tracing::error!(
            dlq_id = %entry.id,
            product_id = %product_id,
            quantity = quantity,
            context = %entry.context,
            error = %entry.error_message,
            "💀 Adding unreleased reservation to Dead Letter Queue"
        );

        let id = entry.id;
        self.requeue(entry).await;
        id
    }

    /// Put an entry back, e.g. after another failed redrive attempt.
    pub async fn requeue(&self, entry: DeadLetter) {
        let mut entries = self.entries.lock().await;
        entries.push(entry);
        self.metrics.set_dlq_depth(entries.len());
    }

    /// Remove and return every entry.
    pub async fn take_all(&self) -> Vec<DeadLetter> {
        let mut entries = self.entries.lock().await;
        let taken = std::mem::take(&mut *entries);
        self.metrics.set_dlq_depth(0);
        taken
    }

    /// Oldest entries first.
    pub async fn entries(&self, limit: usize) -> Vec<DeadLetter> {
        self.entries.lock().await.iter().take(limit).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> DlqStats {
        let entries = self.entries.lock().await;
        let mut unreleased_by_product: HashMap<Uuid, i64> = HashMap::new();
        for entry in entries.iter() {
            *unreleased_by_product.entry(entry.product_id).or_default() += i64::from(entry.quantity);
        }

        DlqStats {
            total_entries: entries.len(),
            unreleased_by_product,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> DeadLetterQueue {
        DeadLetterQueue::new(Arc::new(Metrics::new().unwrap()))
    }

    #[tokio::test]
    async fn test_push_and_stats() {
        let dlq = queue();
        let product = Uuid::new_v4();

        dlq.push(product, 2, "create_order user=a", "connection reset").await;
        dlq.push(product, 3, "cancel order=x", "connection reset").await;
        dlq.push(Uuid::new_v4(), 1, "create_order user=b", "timeout").await;

        let stats = dlq.stats().await;
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.unreleased_by_product[&product], 5);
    }

    #[tokio::test]
    async fn test_entries_respects_limit_and_order() {
        let dlq = queue();
        let first = dlq.push(Uuid::new_v4(), 1, "a", "e").await;
        dlq.push(Uuid::new_v4(), 1, "b", "e").await;

        let entries = dlq.entries(1).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, first);
        assert_eq!(entries[0].failure_count, 1);
    }

    #[tokio::test]
    async fn test_take_all_drains_and_updates_gauge() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let dlq = DeadLetterQueue::new(Arc::clone(&metrics));
        dlq.push(Uuid::new_v4(), 1, "a", "e").await;
        assert_eq!(metrics.dlq_entries.get(), 1);

        let taken = dlq.take_all().await;

        assert_eq!(taken.len(), 1);
        assert!(dlq.is_empty().await);
        assert_eq!(metrics.dlq_entries.get(), 0);
    }
}
