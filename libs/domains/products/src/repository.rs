use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ProductError, ProductResult};
use crate::models::{InventoryStats, Product, ProductFilter, StockAction, UpdateProduct};

/// Repository trait for Product persistence
///
/// Products are keyed by barcode. Every write takes the timestamp to stamp so
/// the caller decides what "now" is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Get a product by barcode. Never modifies the record.
    async fn find_by_barcode(&self, barcode: &str) -> ProductResult<Option<Product>>;

    /// Set `lastScanned` and nothing else. `None` if the barcode is unknown.
    async fn touch(&self, barcode: &str, at: DateTime<Utc>) -> ProductResult<Option<Product>>;

    /// Check if a barcode is already registered
    async fn exists(&self, barcode: &str) -> ProductResult<bool>;

    /// Insert a new product; `DuplicateBarcode` if the barcode is taken
    async fn insert(&self, product: Product) -> ProductResult<Product>;

    /// Apply a stock action atomically per document. An increase that would
    /// pass `MAX_STOCK` fails with `Validation` and changes nothing.
    async fn update_stock(
        &self,
        barcode: &str,
        action: StockAction,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> ProductResult<Product>;

    /// Overwrite the fields present in `changes`
    async fn update(
        &self,
        barcode: &str,
        changes: UpdateProduct,
        at: DateTime<Utc>,
    ) -> ProductResult<Product>;

    /// Permanently delete a product
    async fn delete(&self, barcode: &str) -> ProductResult<()>;

    /// List products, most recently updated first
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    /// Distinct categories in use, sorted ascending
    async fn categories(&self) -> ProductResult<Vec<String>>;

    /// Aggregate dashboard counters
    async fn stats(&self) -> ProductResult<InventoryStats>;
}

/// Process-local repository used by tests and for running without MongoDB.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<String, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_barcode(&self, barcode: &str) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(barcode).cloned())
    }

    async fn touch(&self, barcode: &str, at: DateTime<Utc>) -> ProductResult<Option<Product>> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(barcode).map(|product| {
            product.last_scanned = Some(at);
            product.clone()
        }))
    }

    async fn exists(&self, barcode: &str) -> ProductResult<bool> {
        let products = self.products.read().await;
        Ok(products.contains_key(barcode))
    }

    async fn insert(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        if products.contains_key(&product.barcode) {
            return Err(ProductError::DuplicateBarcode(product.barcode));
        }

        products.insert(product.barcode.clone(), product.clone());
        tracing::info!(barcode = %product.barcode, "Created product");
        Ok(product)
    }

    async fn update_stock(
        &self,
        barcode: &str,
        action: StockAction,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(barcode)
            .ok_or_else(|| ProductError::NotFound(barcode.to_string()))?;

        product.apply_stock_change(action, quantity, at)?;
        Ok(product.clone())
    }

    async fn update(
        &self,
        barcode: &str,
        changes: UpdateProduct,
        at: DateTime<Utc>,
    ) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(barcode)
            .ok_or_else(|| ProductError::NotFound(barcode.to_string()))?;

        product.apply_update(changes, at);
        Ok(product.clone())
    }

    async fn delete(&self, barcode: &str) -> ProductResult<()> {
        let mut products = self.products.write().await;
        products
            .remove(barcode)
            .map(|_| ())
            .ok_or_else(|| ProductError::NotFound(barcode.to_string()))
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;

        let mut result: Vec<Product> = products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.barcode.cmp(&b.barcode))
        });
        Ok(result)
    }

    async fn categories(&self) -> ProductResult<Vec<String>> {
        let products = self.products.read().await;
        let categories: BTreeSet<&str> = products.values().map(|p| p.category.as_str()).collect();
        Ok(categories.into_iter().map(str::to_string).collect())
    }

    async fn stats(&self) -> ProductResult<InventoryStats> {
        let products = self.products.read().await;
        Ok(InventoryStats::from_products(products.values()))
    }
}
