// ============================================================================
// Order Domain - Orders, Line Items and Status Rules
// ============================================================================
//
// This module contains ALL Order-specific types:
// - Value objects (OrderLine, OrderItem, OrderStatus)
// - Entity (Order, NewOrder)
// - Errors (OrderError, ErrorKind)
// - Status transition policy
//
// Orchestration lives in src/service/, persistence in src/store/.
//
// ============================================================================

pub mod value_objects;
pub mod entity;
pub mod errors;
pub mod transitions;

// Re-export for convenience
pub use value_objects::*;
pub use entity::*;
pub use errors::*;
pub use transitions::*;
