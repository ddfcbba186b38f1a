use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A product sitting in the fridge.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub expiration_date: NaiveDate,
    pub date_added: NaiveDate,
}

/// Fields the caller supplies when adding a product; id and date added
/// are assigned by the store.
#[derive(Debug, Deserialize, Clone)]
pub struct NewProduct {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub expiration_date: NaiveDate,
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("product name is required")]
    MissingName,
    #[error("product unit is required")]
    MissingUnit,
    #[error("product quantity must be a positive number")]
    InvalidQuantity,
    #[error("product not found: {0}")]
    ProductNotFound(String),
}

/// Freshness bucket relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationStatus {
    Expired,
    ExpiringSoon,
    Fresh,
}

impl fmt::Display for ExpirationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExpirationStatus::Expired => "expired",
            ExpirationStatus::ExpiringSoon => "expiring soon",
            ExpirationStatus::Fresh => "fresh",
        };
        write!(f, "{}", label)
    }
}

impl Product {
    /// Classify this product's freshness as of `today`.
    ///
    /// Strictly before today is expired; today through three days out is
    /// expiring soon; everything later is fresh.
    pub fn expiration_status(&self, today: NaiveDate) -> ExpirationStatus {
        let days_left = (self.expiration_date - today).num_days();
        if days_left < 0 {
            ExpirationStatus::Expired
        } else if days_left <= 3 {
            ExpirationStatus::ExpiringSoon
        } else {
            ExpirationStatus::Fresh
        }
    }
}

/// Inventory access as the suggestion flow needs it. The in-memory store
/// below is the only implementation; the trait keeps the seam open for a
/// persistent backend.
pub trait InventoryStore {
    fn list(&self) -> Vec<Product>;
    fn add(&mut self, new_product: NewProduct) -> Result<Product, InventoryError>;
    fn remove(&mut self, id: &str) -> Result<Product, InventoryError>;
}

/// Vec-backed store with a monotonic id counter. Ids are never reused,
/// even after removals.
pub struct MemoryInventoryStore {
    products: Vec<Product>,
    next_id: u64,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        MemoryInventoryStore {
            products: Vec::new(),
            next_id: 1,
        }
    }

    /// A store pre-seeded with a small demo inventory, dated relative to
    /// `today` so the milk always shows up as expiring soon.
    pub fn with_sample_products(today: NaiveDate) -> Self {
        let sample = [
            ("Milk", 1.0, "gallon", 2),
            ("Eggs", 12.0, "pieces", 14),
            ("Cheese", 200.0, "grams", 17),
        ];
        let products = sample
            .iter()
            .enumerate()
            .map(|(index, (name, quantity, unit, days))| Product {
                id: (index as u64 + 1).to_string(),
                name: name.to_string(),
                quantity: *quantity,
                unit: unit.to_string(),
                expiration_date: today + Duration::days(*days),
                date_added: today,
            })
            .collect::<Vec<_>>();
        let next_id = products.len() as u64 + 1;
        MemoryInventoryStore { products, next_id }
    }
}

impl Default for MemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryStore for MemoryInventoryStore {
    fn list(&self) -> Vec<Product> {
        self.products.clone()
    }

    fn add(&mut self, new_product: NewProduct) -> Result<Product, InventoryError> {
        if new_product.name.trim().is_empty() {
            return Err(InventoryError::MissingName);
        }
        if new_product.unit.trim().is_empty() {
            return Err(InventoryError::MissingUnit);
        }
        if !new_product.quantity.is_finite() || new_product.quantity <= 0.0 {
            return Err(InventoryError::InvalidQuantity);
        }

        let product = Product {
            id: self.next_id.to_string(),
            name: new_product.name,
            quantity: new_product.quantity,
            unit: new_product.unit,
            expiration_date: new_product.expiration_date,
            date_added: Local::now().date_naive(),
        };
        self.next_id += 1;
        self.products.push(product.clone());
        Ok(product)
    }

    fn remove(&mut self, id: &str) -> Result<Product, InventoryError> {
        let position = self
            .products
            .iter()
            .position(|product| product.id == id)
            .ok_or_else(|| InventoryError::ProductNotFound(id.to_string()))?;
        Ok(self.products.remove(position))
    }
}
