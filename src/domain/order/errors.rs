use std::time::Duration;

use uuid::Uuid;

use super::value_objects::OrderStatus;
use crate::store::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0:?}")]
pub struct ParseStatusError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: Uuid, requested: i32 },

    #[error("Invalid order status: {0}")]
    InvalidStatus(#[from] ParseStatusError),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order {0} was modified concurrently")]
    Conflict(Uuid),

    #[error("Order creation exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Order saga aborted: {0}")]
    Aborted(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Coarse error classes, matched on instead of error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientStock,
    InvalidTransition,
    Conflict,
    Timeout,
    Storage,
}

impl ErrorKind {
    /// HTTP status the delivery layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InsufficientStock | ErrorKind::InvalidTransition => 422,
            ErrorKind::Storage => 500,
            ErrorKind::Timeout => 504,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Storage => "storage",
        }
    }
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::Validation(_) => ErrorKind::Validation,
            OrderError::OrderNotFound(_) | OrderError::ProductNotFound(_) => ErrorKind::NotFound,
            OrderError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            OrderError::InvalidStatus(_) | OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            OrderError::Conflict(_) => ErrorKind::Conflict,
            OrderError::DeadlineExceeded(_) => ErrorKind::Timeout,
            OrderError::Aborted(_) | OrderError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind().status_code() < 500
    }

    /// Lift a product-store failure into the order vocabulary.
    pub fn from_product_store(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id, .. } => OrderError::ProductNotFound(id),
            StoreError::InsufficientStock { product_id, requested } => {
                OrderError::InsufficientStock { product_id, requested }
            }
            StoreError::InvalidProduct(e) => OrderError::Validation(e.to_string()),
            other => OrderError::Storage(other),
        }
    }

    /// Lift an order-store failure into the order vocabulary.
    pub fn from_order_store(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id, .. } => OrderError::OrderNotFound(id),
            StoreError::Conflict { id, .. } => OrderError::Conflict(id),
            other => OrderError::Storage(other),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
