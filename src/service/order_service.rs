use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::order::{
    NewOrder, NewOrderItem, Order, OrderError, OrderLine, OrderStatus, TransitionPolicy,
};
use crate::inventory::{InventoryLedger, Reservations};
use crate::metrics::Metrics;
use crate::store::{OrderStore, ProductStore};

// ============================================================================
// Order Service
// ============================================================================
//
// Orchestrates: Validate → Reserve (per line) → Snapshot → Persist
//
// Creation is a saga: every reservation is recorded, and any failure after
// the first one releases them all (newest first) before the error returns.
// Mutating work runs on a spawned task so a caller dropping its future can't
// strand a reservation between reserve and compensate.
//
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub transition_policy: TransitionPolicy,
    /// Budget for one create-order saga, checked before every storage step.
    pub reservation_deadline: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            transition_policy: TransitionPolicy::Permissive,
            reservation_deadline: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    inner: Arc<Inner>,
}

struct Inner {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    ledger: InventoryLedger,
    metrics: Arc<Metrics>,
    settings: ServiceSettings,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        ledger: InventoryLedger,
        metrics: Arc<Metrics>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                orders,
                products,
                ledger,
                metrics,
                settings,
            }),
        }
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.inner.ledger
    }

    pub fn settings(&self) -> ServiceSettings {
        self.inner.settings
    }

    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create_order(&self, user_id: &str, lines: Vec<OrderLine>) -> Result<Order, OrderError> {
        let started = std::time::Instant::now();

        let result = match validate_new_order(user_id, &lines) {
            Ok(()) => {
                let inner = Arc::clone(&self.inner);
                let user_id = user_id.to_string();
                detached(async move { inner.place_order(user_id, lines).await }).await
            }
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(order) => {
                self.inner.metrics.record_order_outcome(None, elapsed);
                tracing::info!(order_id = %order.id, total = %order.total, "✅ Order created");
            }
            Err(e) => {
                self.inner.metrics.record_order_outcome(Some(e.kind().as_label()), elapsed);
                if e.is_client_error() {
                    tracing::warn!(error = %e, "Order rejected");
                } else {
                    tracing::error!(error = %e, "❌ Order creation failed");
                }
            }
        }

        result
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: Uuid) -> Result<Order, OrderError> {
        self.inner
            .orders
            .get_by_id(id)
            .await
            .map_err(OrderError::from_order_store)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user_orders(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        if user_id.trim().is_empty() {
            return Err(OrderError::Validation("user id must not be empty".to_string()));
        }

        self.inner
            .orders
            .get_by_user(user_id)
            .await
            .map_err(OrderError::from_order_store)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_all_orders(&self) -> Result<Vec<Order>, OrderError> {
        self.inner.orders.get_all().await.map_err(OrderError::from_order_store)
    }

    /// Move an order to `new_status`. Cancelling releases the order's stock,
    /// once, by whichever caller wins the status write.
    #[tracing::instrument(skip(self, id), fields(order_id = %id))]
    pub async fn update_order_status(&self, id: Uuid, new_status: &str) -> Result<Order, OrderError> {
        let status: OrderStatus = new_status.parse()?;

        let inner = Arc::clone(&self.inner);
        detached(async move { inner.apply_status(id, status).await }).await
    }
}

impl Inner {
    async fn place_order(&self, user_id: String, lines: Vec<OrderLine>) -> Result<Order, OrderError> {
        let deadline = Instant::now() + self.settings.reservation_deadline;
        let context = format!("create_order user={user_id}");
        let mut guard = SagaGuard::new(self.ledger.clone(), context.clone());

        let result = self
            .reserve_and_persist(&user_id, &lines, deadline, guard.reservations())
            .await;
        let reservations = guard.complete();

        match result {
            Ok(order) => Ok(order),
            Err(e) => {
                if !reservations.is_empty() {
                    let report = self.ledger.release_all(&reservations, &context).await;
                    tracing::warn!(
                        released = report.released,
                        dead_lettered = report.dead_lettered,
                        error = %e,
                        "Compensated partial order"
                    );
                }
                Err(e)
            }
        }
    }

    async fn reserve_and_persist(
        &self,
        user_id: &str,
        lines: &[OrderLine],
        deadline: Instant,
        reservations: &mut Reservations,
    ) -> Result<Order, OrderError> {
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            self.check_deadline(deadline)?;
            let product = tokio::time::timeout_at(deadline, self.products.get_by_id(line.product_id))
                .await
                .map_err(|_| OrderError::DeadlineExceeded(self.settings.reservation_deadline))?
                .map_err(OrderError::from_product_store)?;

            self.check_deadline(deadline)?;
            self.ledger.reserve(line.product_id, line.quantity).await?;
            reservations.record(line.product_id, line.quantity);

            items.push(NewOrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: product.unit_price,
            });
        }

        self.check_deadline(deadline)?;
        self.orders
            .create(NewOrder::pending(user_id, items)?)
            .await
            .map_err(OrderError::Storage)
    }

    fn check_deadline(&self, deadline: Instant) -> Result<(), OrderError> {
        if Instant::now() >= deadline {
            return Err(OrderError::DeadlineExceeded(self.settings.reservation_deadline));
        }
        Ok(())
    }

    async fn apply_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let current = self
            .orders
            .get_by_id(id)
            .await
            .map_err(OrderError::from_order_store)?;

        if current.status == OrderStatus::Cancelled && status == OrderStatus::Cancelled {
            tracing::debug!("Order already cancelled");
            return Ok(current);
        }

        self.settings.transition_policy.check(current.status, status)?;

        let updated = self
            .orders
            .update_status(id, current.status, status)
            .await
            .map_err(OrderError::from_order_store)?;

        self.metrics.record_status_update(status.as_str());
        tracing::info!(from = %current.status, to = %status, "Order status updated");

        if status == OrderStatus::Cancelled {
            let held = Reservations::held_by(&updated.items);
            let report = self.ledger.release_all(&held, &format!("cancel order={id}")).await;
            if !report.is_complete() {
                tracing::error!(
                    dead_lettered = report.dead_lettered,
                    "Order cancelled but part of its stock is still held"
                );
            }
        }

        Ok(updated)
    }
}

fn validate_new_order(user_id: &str, lines: &[OrderLine]) -> Result<(), OrderError> {
    if user_id.trim().is_empty() {
        return Err(OrderError::Validation("user id must not be empty".to_string()));
    }
    if lines.is_empty() {
        return Err(OrderError::Validation("order must contain at least one item".to_string()));
    }
    if let Some(line) = lines.iter().find(|line| line.quantity <= 0) {
        return Err(OrderError::Validation(format!(
            "quantity for product {} must be positive, got {}",
            line.product_id, line.quantity
        )));
    }
    Ok(())
}

/// Owns a saga's reservations until the saga reaches a normal return. If the
/// saga unwinds instead (a panic), dropping the guard releases them on a
/// fresh task so no stock stays held by an order that was never written.
struct SagaGuard {
    ledger: InventoryLedger,
    context: String,
    reservations: Reservations,
    armed: bool,
}

impl SagaGuard {
    fn new(ledger: InventoryLedger, context: String) -> Self {
        Self {
            ledger,
            context,
            reservations: Reservations::default(),
            armed: true,
        }
    }

    fn reservations(&mut self) -> &mut Reservations {
        &mut self.reservations
    }

    /// The saga returned; hand the reservations back to the caller.
    fn complete(mut self) -> Reservations {
        self.armed = false;
        std::mem::take(&mut self.reservations)
    }
}

impl Drop for SagaGuard {
    fn drop(&mut self) {
        if !self.armed || self.reservations.is_empty() {
            return;
        }

        let reservations = std::mem::take(&mut self.reservations);
        tracing::error!(
            alarm = "stock_consistency",
            context = %self.context,
            reservations = reservations.len(),
            "🚨 Order saga unwound while holding stock; releasing"
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let ledger = self.ledger.clone();
                let context = std::mem::take(&mut self.context);
                handle.spawn(async move {
                    ledger.release_all(&reservations, &context).await;
                });
            }
            Err(e) => {
                tracing::error!(
                    alarm = "stock_consistency",
                    error = %e,
                    "No runtime left to release stranded reservations"
                );
            }
        }
    }
}

/// Run `work` to completion on its own task, whatever happens to the caller.
async fn detached<F>(work: F) -> Result<Order, OrderError>
where
    F: Future<Output = Result<Order, OrderError>> + Send + 'static,
{
    tokio::spawn(work.instrument(tracing::Span::current()))
        .await
        .unwrap_or_else(|e| Err(OrderError::Aborted(e.to_string())))
}

// ============================================================================
// Unit Tests
// ============================================================================
