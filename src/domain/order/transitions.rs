use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Status Transitions
// ============================================================================
//
// Permissive: any enumerated status may follow any other, except that an
//             order never leaves `cancelled` (its stock is already released).
// Strict:     pending   -> confirmed | cancelled
//             confirmed -> shipped
//             shipped   -> delivered
//             delivered, cancelled are terminal
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => from != OrderStatus::Cancelled || to == OrderStatus::Cancelled,
            TransitionPolicy::Strict => matches!(
                (from, to),
                (OrderStatus::Pending, OrderStatus::Confirmed)
                    | (OrderStatus::Pending, OrderStatus::Cancelled)
                    | (OrderStatus::Confirmed, OrderStatus::Shipped)
                    | (OrderStatus::Shipped, OrderStatus::Delivered)
            ),
        }
    }

    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition { from, to })
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(format!("unknown transition policy: {other}")),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
