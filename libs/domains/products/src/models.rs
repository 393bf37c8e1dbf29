use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::error::{ProductError, ProductResult};

/// Threshold applied when a product is created without `minStock`.
pub const DEFAULT_MIN_STOCK: i64 = 10;

/// Quantity applied when a stock update omits `quantity`.
pub const DEFAULT_STOCK_QUANTITY: i64 = 1;

/// Largest stock level, threshold or quantity a product can hold.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Product entity, keyed by its barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Barcode (EAN, UPC, QR payload...). Unique and immutable.
    pub barcode: String,
    pub name: String,
    /// Free-text category
    pub category: String,
    /// Unit cost
    pub cost: f64,
    /// Units on hand, never negative
    pub stock: i64,
    /// Low-stock threshold
    pub min_stock: i64,
    /// Last time the product was scanned or changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scanned: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(
        length(min = 1, max = 128, message = "barcode must be 1-128 characters"),
        custom(function = "not_blank", message = "barcode is required")
    )]
    pub barcode: String,
    #[validate(
        length(min = 1, max = 200, message = "name must be 1-200 characters"),
        custom(function = "not_blank", message = "name is required")
    )]
    pub name: String,
    #[validate(
        length(min = 1, max = 100, message = "category must be 1-100 characters"),
        custom(function = "not_blank", message = "category is required")
    )]
    pub category: String,
    #[validate(range(min = 0.0, message = "cost must be >= 0"))]
    pub cost: f64,
    #[validate(range(
        min = 0,
        max = 1_000_000_000,
        message = "stock must be between 0 and 1000000000"
    ))]
    #[serde(default)]
    pub stock: i64,
    #[validate(range(
        min = 0,
        max = 1_000_000_000,
        message = "minStock must be between 0 and 1000000000"
    ))]
    #[serde(default = "default_min_stock")]
    pub min_stock: i64,
}

/// DTO for updating an existing product.
///
/// Only fields present in the payload change. Unknown fields, including
/// `barcode`, are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(
        length(min = 1, max = 200, message = "name must be 1-200 characters"),
        custom(function = "not_blank", message = "name is required")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "category must be 1-100 characters"),
        custom(function = "not_blank", message = "category is required")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[validate(range(min = 0.0, message = "cost must be >= 0"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[validate(range(
        min = 0,
        max = 1_000_000_000,
        message = "stock must be between 0 and 1000000000"
    ))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[validate(range(
        min = 0,
        max = 1_000_000_000,
        message = "minStock must be between 0 and 1000000000"
    ))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<i64>,
}

/// Stock adjustment kind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockAction {
    /// Add `quantity` units
    Increase,
    /// Remove `quantity` units, stopping at zero
    Decrease,
    /// Replace the count with `quantity`
    Set,
}

/// Stock update request.
///
/// `action` stays a string on the wire so an unknown value is reported as a
/// validation error rather than a body parse failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockUpdate {
    /// One of `increase`, `decrease`, `set`
    #[schema(example = "increase")]
    pub action: String,
    #[validate(range(
        min = 0,
        max = 1_000_000_000,
        message = "quantity must be between 0 and 1000000000"
    ))]
    #[serde(default = "default_stock_quantity")]
    pub quantity: i64,
}

impl StockUpdate {
    pub fn new(action: StockAction, quantity: i64) -> Self {
        Self {
            action: action.to_string(),
            quantity,
        }
    }
}

/// Query filters for listing products
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Exact category match; empty means no filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `true` keeps only products with `stock <= minStock`; anything else is ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock: Option<String>,
}

impl ProductFilter {
    /// Category to filter on, ignoring an empty value.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    /// Whether the low-stock filter is active.
    pub fn low_stock_only(&self) -> bool {
        self.low_stock.as_deref() == Some("true")
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category() {
            if product.category != category {
                return false;
            }
        }
        !self.low_stock_only() || product.is_low_stock()
    }
}

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_products: u64,
    /// Sum of `cost * stock` over all products
    pub total_value: f64,
    pub low_stock_count: u64,
    pub categories_count: u64,
}

impl InventoryStats {
    /// Compute the counters over an in-memory set of products.
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut stats = Self::default();
        let mut categories = std::collections::BTreeSet::new();

        for product in products {
            stats.total_products += 1;
            stats.total_value += product.stock_value();
            if product.is_low_stock() {
                stats.low_stock_count += 1;
            }
            categories.insert(product.category.as_str());
        }

        stats.categories_count = categories.len() as u64;
        stats
    }
}

/// Result of a barcode lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum BarcodeLookup {
    /// `{ "exists": true, "product": {...} }`
    Found { exists: bool, product: Product },
    /// `{ "exists": false, "barcode": "..." }`
    Missing { exists: bool, barcode: String },
}

impl BarcodeLookup {
    pub fn found(product: Product) -> Self {
        Self::Found {
            exists: true,
            product,
        }
    }

    pub fn missing(barcode: impl Into<String>) -> Self {
        Self::Missing {
            exists: false,
            barcode: barcode.into(),
        }
    }

    pub fn product(&self) -> Option<&Product> {
        match self {
            Self::Found { product, .. } => Some(product),
            Self::Missing { .. } => None,
        }
    }

    pub fn into_product(self) -> Option<Product> {
        match self {
            Self::Found { product, .. } => Some(product),
            Self::Missing { .. } => None,
        }
    }
}

/// `{ "success": true, "product": {...} }` returned by mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductEnvelope {
    pub success: bool,
    pub product: Product,
}

impl From<Product> for ProductEnvelope {
    fn from(product: Product) -> Self {
        Self {
            success: true,
            product,
        }
    }
}

/// `{ "success": true, "message": "Product deleted" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteResult {
    pub success: bool,
    pub message: String,
}

impl DeleteResult {
    pub fn deleted() -> Self {
        Self {
            success: true,
            message: "Product deleted".to_string(),
        }
    }
}

fn default_min_stock() -> i64 {
    DEFAULT_MIN_STOCK
}

fn default_stock_quantity() -> i64 {
    DEFAULT_STOCK_QUANTITY
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl Product {
    /// Create a new product from CreateProduct DTO, stamped with `now`.
    pub fn new(input: CreateProduct, now: DateTime<Utc>) -> Self {
        Self {
            barcode: input.barcode,
            name: input.name,
            category: input.category,
            cost: input.cost,
            stock: input.stock,
            min_stock: input.min_stock,
            last_scanned: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates from UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(cost) = update.cost {
            self.cost = cost;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(min_stock) = update.min_stock {
            self.min_stock = min_stock;
        }
        self.last_scanned = Some(now);
        self.updated_at = now;
    }

    /// Apply a stock action. `decrease` clamps at zero; an `increase` past
    /// [`MAX_STOCK`] is rejected and leaves the product untouched.
    pub fn apply_stock_change(
        &mut self,
        action: StockAction,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> ProductResult<()> {
        self.stock = next_stock(self.stock, action, quantity)
            .ok_or_else(|| ProductError::stock_limit(&self.barcode))?;
        self.last_scanned = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Whether stock has reached the low-stock threshold
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Value of the units on hand
    pub fn stock_value(&self) -> f64 {
        self.cost * self.stock as f64
    }
}

/// Stock level after applying `action` with `quantity` to `current`.
///
/// `None` when an increase would go past [`MAX_STOCK`].
pub fn next_stock(current: i64, action: StockAction, quantity: i64) -> Option<i64> {
    match action {
        StockAction::Increase => current
            .checked_add(quantity)
            .filter(|stock| *stock <= MAX_STOCK),
        StockAction::Decrease => Some(current.saturating_sub(quantity).max(0)),
        StockAction::Set => Some(quantity),
    }
}
