//! Catalog lookup boundary.
//!
//! The catalog itself (rendering, search, admin) is another system; the
//! orchestrator only needs a read-only lookup at order-creation time to
//! snapshot title and price.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Money, ProductId};
use tokio::sync::RwLock;

/// The product fields the orchestrator snapshots at order time.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
}

/// Read-only product lookup.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Looks up a product by ID. Returns `None` for unknown products.
    async fn lookup(&self, product_id: &ProductId) -> Option<CatalogProduct>;
}

/// In-memory catalog for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, CatalogProduct>>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub async fn put(&self, product: CatalogProduct) {
        self.products
            .write()
            .await
            .insert(product.product_id.clone(), product);
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalog {
    async fn lookup(&self, product_id: &ProductId) -> Option<CatalogProduct> {
        self.products.read().await.get(product_id).cloned()
    }
}
