//! Inventory Collaborator Seam
//!
//! The scanner's only view of the business inventory: a read-only snapshot
//! of active products once per tick. `MemoryInventory` is the in-process
//! implementation the daemon loads from a TOML file; tests drive it
//! directly.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::scanner::error::ScanResult;

/// Inventory snapshot entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub stock: u32,
    /// Expiry date for perishable stock (dates are serialized as
    /// "YYYY-MM-DD" strings)
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Read-only source of inventory snapshots
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Current snapshot of all active products. The scan never mutates
    /// inventory; its only output is through the notification service.
    async fn list_active_products(&self) -> ScanResult<Vec<Product>>;
}

/// Shape of a TOML inventory file: a `[[products]]` array
#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    products: Vec<Product>,
}

/// In-process inventory backed by a product list
pub struct MemoryInventory {
    products: RwLock<Vec<Product>>,
}

impl MemoryInventory {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    /// Parse an inventory from TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: InventoryFile =
            toml::from_str(content).context("failed to parse inventory TOML")?;
        Ok(Self::new(file.products))
    }

    /// Load an inventory file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read inventory file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid inventory file: {}", path.display()))
    }

    /// Replace a product's stock level (simulates warehouse updates)
    pub fn set_stock(&self, product_id: &str, stock: u32) {
        let mut products = self.products.write();
        if let Some(product) = products.iter_mut().find(|p| p.id == product_id) {
            product.stock = stock;
        }
    }

    /// Replace a product's expiry date
    pub fn set_expiry(&self, product_id: &str, expiry_date: Option<NaiveDate>) {
        let mut products = self.products.write();
        if let Some(product) = products.iter_mut().find(|p| p.id == product_id) {
            product.expiry_date = expiry_date;
        }
    }

    /// Add or replace a product by id
    pub fn upsert(&self, product: Product) {
        let mut products = self.products.write();
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
    }

    pub fn product_count(&self) -> usize {
        self.products.read().len()
    }
}

#[async_trait]
impl InventorySource for MemoryInventory {
    async fn list_active_products(&self) -> ScanResult<Vec<Product>> {
        Ok(self
            .products
            .read()
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }
}
