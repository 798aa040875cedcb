use rust_decimal::Decimal;

// ============================================================================
// Product Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("Product name is required")]
    EmptyName,

    #[error("Product price cannot be negative: {0}")]
    NegativePrice(Decimal),

    #[error("Product stock cannot be negative: {0}")]
    NegativeStock(i32),
}
