use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderStore, ProductStore, StoreError};
use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::domain::product::{NewProduct, Product, ProductError};

// ============================================================================
// In-Memory Product Store
// ============================================================================
//
// Every stock change happens under a single write lock, so the
// check-and-decrement in `reserve_stock` is one atomic step, exactly like the
// `UPDATE ... WHERE stock >= qty` the Postgres store issues.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryProductStore {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, new_product: NewProduct) -> Result<Product, StoreError> {
        new_product.validate()?;

        let product = new_product.into_product(Uuid::now_v7(), Utc::now());
        self.products.write().await.insert(product.id, product.clone());
        Ok(product)
    }

    /// Change the catalogue price. Existing orders keep their snapshot.
    pub async fn set_price(&self, id: Uuid, unit_price: Decimal) -> Result<Product, StoreError> {
        if unit_price < Decimal::ZERO {
            return Err(ProductError::NegativePrice(unit_price).into());
        }

        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or_else(|| StoreError::product_not_found(id))?;
        product.unit_price = unit_price;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    pub async fn stock_of(&self, id: Uuid) -> Option<i32> {
        self.products.read().await.get(&id).map(|p| p.stock_quantity)
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Product, StoreError> {
        self.products
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::product_not_found(id))
    }

    async fn reserve_stock(&self, id: Uuid, quantity: i32) -> Result<(), StoreError> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or_else(|| StoreError::product_not_found(id))?;

        if !product.has_stock_for(quantity) {
            return Err(StoreError::InsufficientStock {
                product_id: id,
                requested: quantity,
            });
        }

        product.stock_quantity -= quantity;
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn release_stock(&self, id: Uuid, quantity: i32) -> Result<(), StoreError> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or_else(|| StoreError::product_not_found(id))?;

        product.stock_quantity = product
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| StoreError::Backend(format!("stock overflow on product {id}")))?;
        product.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// In-Memory Order Store
// ============================================================================

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }

    fn sorted(mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        orders
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        let order = order.into_order(Uuid::now_v7(), Utc::now());
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Order, StoreError> {
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::order_not_found(id))
    }

    async fn get_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(Self::sorted(
            orders.values().filter(|o| o.user_id == user_id).cloned().collect(),
        ))
    }

    async fn get_all(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(Self::sorted(orders.values().cloned().collect()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or_else(|| StoreError::order_not_found(id))?;

        if order.status != expected {
            return Err(StoreError::Conflict { id, expected });
        }

        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
