use uuid::Uuid;

use crate::domain::order::OrderStatus;
use crate::domain::product::ProductError;

// ============================================================================
// Store Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: Uuid, requested: i32 },

    #[error("Order {id} is no longer {expected}")]
    Conflict { id: Uuid, expected: OrderStatus },

    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn product_not_found(id: Uuid) -> Self {
        StoreError::NotFound { entity: "product", id }
    }

    pub fn order_not_found(id: Uuid) -> Self {
        StoreError::NotFound { entity: "order", id }
    }
}
