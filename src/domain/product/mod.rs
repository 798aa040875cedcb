// ============================================================================
// Product Domain
// ============================================================================
//
// Product catalogue entries as seen by the fulfillment path. Stock levels are
// only ever changed through the conditional update in the product store.
//
// ============================================================================

pub mod entity;
pub mod errors;

pub use entity::*;
pub use errors::*;
