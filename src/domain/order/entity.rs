use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;
use super::value_objects::{OrderItem, OrderStatus};

// ============================================================================
// Order Entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub status: OrderStatus,
    pub total: Decimal,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of the snapshotted line totals. Equal to `total` for every order
    /// produced by the order service; `None` on overflow.
    pub fn items_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
    }
}

// ============================================================================
// New Order - what the service hands to the order store
// ============================================================================

/// A line with its price already captured from the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: String,
    pub status: OrderStatus,
    pub total: Decimal,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Build a pending order whose total is derived from the item snapshots.
    /// Fails if any line total or the order total leaves `Decimal`'s range.
    pub fn pending(user_id: impl Into<String>, items: Vec<NewOrderItem>) -> Result<Self, OrderError> {
        let mut total = Decimal::ZERO;
        for item in &items {
            total = item
                .line_total()
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| {
                    OrderError::Validation(format!(
                        "order total overflows at product {} (quantity {}, price {})",
                        item.product_id, item.quantity, item.unit_price
                    ))
                })?;
        }

        Ok(Self {
            user_id: user_id.into(),
            status: OrderStatus::Pending,
            total,
            items,
        })
    }

    /// Materialize with store-assigned identities and timestamps.
    pub fn into_order(self, id: Uuid, now: DateTime<Utc>) -> Order {
        let items = self
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::now_v7(),
                order_id: id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        Order {
            id,
            user_id: self.user_id,
            status: self.status,
            total: self.total,
            items,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(price_cents: i64, quantity: i32) -> NewOrderItem {
        NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price: Decimal::new(price_cents, 2),
        }
    }

    #[test]
    fn test_pending_order_total_is_sum_of_lines() {
        let order = NewOrder::pending("user-1", vec![snapshot(1000, 2), snapshot(2000, 1)]).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Decimal::new(4000, 2));
    }

    #[test]
    fn test_decimal_total_is_exact() {
        // 0.10 * 3 must be exactly 0.30, not a float approximation
        let order = NewOrder::pending("user-1", vec![snapshot(10, 3)]).unwrap();
        assert_eq!(order.total.to_string(), "0.30");
    }

    #[test]
    fn test_into_order_links_items_to_order() {
        let id = Uuid::now_v7();
        let order = NewOrder::pending("user-1", vec![snapshot(500, 1), snapshot(250, 4)])
            .unwrap()
            .into_order(id, Utc::now());

        assert_eq!(order.id, id);
        assert_eq!(order.items.len(), 2);
        assert!(order.items.iter().all(|item| item.order_id == id));
        assert_eq!(order.items_total(), Some(order.total));
        assert_eq!(order.created_at, order.updated_at);
    }

    #[test]
    fn test_overflowing_total_is_a_validation_error() {
        let line = NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: Decimal::MAX,
        };
        let err = NewOrder::pending("user-1", vec![line]).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        // each line fits, the sum does not
        let half = NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity: 1,
            unit_price: Decimal::MAX,
        };
        let err = NewOrder::pending("user-1", vec![half.clone(), half]).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_order_json_field_names() {
        let order = NewOrder::pending("user-9", vec![snapshot(100, 1)])
            .unwrap()
            .into_order(Uuid::now_v7(), Utc::now());
        let json = serde_json::to_value(&order).unwrap();

        for field in ["id", "user_id", "status", "total", "items", "created_at", "updated_at"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["order_id"], json["id"]);
    }
}
