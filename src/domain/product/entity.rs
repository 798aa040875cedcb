use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::ProductError;

// ============================================================================
// Product Entity
// ============================================================================

/// A sellable product. `stock_quantity` never drops below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "stock")]
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn has_stock_for(&self, quantity: i32) -> bool {
        self.stock_quantity >= quantity
    }
}

/// Payload for seeding or registering a product with a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "stock")]
    pub stock_quantity: i32,
    pub image_url: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, unit_price: Decimal, stock_quantity: i32) -> Self {
        Self {
            name: name.into(),
            description: None,
            unit_price,
            stock_quantity,
            image_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Same rules for every backend: named, non-negative price and stock.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.unit_price < Decimal::ZERO {
            return Err(ProductError::NegativePrice(self.unit_price));
        }
        if self.stock_quantity < 0 {
            return Err(ProductError::NegativeStock(self.stock_quantity));
        }
        Ok(())
    }

    /// Materialize the product with store-assigned identity and timestamps.
    pub fn into_product(self, id: Uuid, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            unit_price: self.unit_price,
            stock_quantity: self.stock_quantity,
            image_url: self.image_url,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
