//! Product Service - Business logic layer

use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    BarcodeLookup, CreateProduct, InventoryStats, Product, ProductFilter, StockAction,
    StockUpdate, UpdateProduct,
};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// The service layer handles validation, business rules, and orchestrates
/// repository operations. It owns the clock: every write is stamped with
/// `Utc::now()` here and passed down.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Look up a barcode as a scan does.
    ///
    /// A hit is followed by a separate touch of `lastScanned`; a miss leaves
    /// the store untouched.
    #[instrument(skip(self))]
    pub async fn lookup(&self, barcode: &str) -> ProductResult<BarcodeLookup> {
        if self.repository.find_by_barcode(barcode).await?.is_none() {
            tracing::debug!(barcode, "Barcode not registered");
            return Ok(BarcodeLookup::missing(barcode));
        }

        // Deleted between the read and the touch
        match self.repository.touch(barcode, Utc::now()).await? {
            Some(product) => Ok(BarcodeLookup::found(product)),
            None => Ok(BarcodeLookup::missing(barcode)),
        }
    }

    /// Register a new product
    #[instrument(skip(self, input), fields(barcode = %input.barcode))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input.validate()?;

        if self.repository.exists(&input.barcode).await? {
            return Err(ProductError::DuplicateBarcode(input.barcode));
        }

        // The insert still reports a duplicate if another request won the race
        self.repository
            .insert(Product::new(input, Utc::now()))
            .await
    }

    /// List products with optional filters
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        self.repository.list(filter).await
    }

    /// Distinct categories in use
    #[instrument(skip(self))]
    pub async fn categories(&self) -> ProductResult<Vec<String>> {
        self.repository.categories().await
    }

    /// Apply an increase/decrease/set to a product's stock
    #[instrument(skip(self, update), fields(action = %update.action, quantity = update.quantity))]
    pub async fn update_stock(&self, barcode: &str, update: StockUpdate) -> ProductResult<Product> {
        update.validate()?;

        let action = StockAction::from_str(&update.action).map_err(|_| {
            ProductError::Validation(format!(
                "action: must be one of increase, decrease, set (got '{}')",
                update.action
            ))
        })?;

        self.repository
            .update_stock(barcode, action, update.quantity, Utc::now())
            .await
    }

    /// Replace the mutable fields present in `input`
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        barcode: &str,
        input: UpdateProduct,
    ) -> ProductResult<Product> {
        input.validate()?;

        self.repository.update(barcode, input, Utc::now()).await
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, barcode: &str) -> ProductResult<()> {
        self.repository.delete(barcode).await
    }

    /// Dashboard counters
    #[instrument(skip(self))]
    pub async fn stats(&self) -> ProductResult<InventoryStats> {
        self.repository.stats().await
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
