// ============================================================================
// Domain Layer - Business Types
// ============================================================================
//
// Plain data types and business rules for the fulfillment core.
// Each entity has its own subdirectory with:
// - Entity / value objects
// - Errors
// - Status rules (orders only)
//
// Nothing in here touches storage. Stores live in src/store/.
//
// ============================================================================

pub mod order;
pub mod product;
