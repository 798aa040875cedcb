// ============================================================================
// Store Layer - Repository Contracts
// ============================================================================
//
// One flat trait per store. The order service and inventory ledger only ever
// see `Arc<dyn ProductStore>` / `Arc<dyn OrderStore>`; backends are chosen at
// wiring time.
//
// Backends:
// - memory/   - tokio-locked maps, used by tests and the demo binary
// - postgres/ - sqlx over PostgreSQL with embedded migrations
//
// ============================================================================

mod errors;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::domain::product::Product;

pub use errors::StoreError;
pub use memory::{InMemoryOrderStore, InMemoryProductStore};
pub use postgres::{PgOrderStore, PgProductStore};

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Product, StoreError>;

    /// Atomically decrement stock by `quantity`, only if at least `quantity`
    /// is available. Must be a single compare-and-set in the backend; callers
    /// never read stock first.
    async fn reserve_stock(&self, id: Uuid, quantity: i32) -> Result<(), StoreError>;

    /// Unconditionally increment stock by `quantity`.
    async fn release_stock(&self, id: Uuid, quantity: i32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist the order and all its items as one write.
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Order, StoreError>;

    async fn get_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError>;

    async fn get_all(&self) -> Result<Vec<Order>, StoreError>;

    /// Set `status` only if the stored status is still `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, StoreError>;
}
