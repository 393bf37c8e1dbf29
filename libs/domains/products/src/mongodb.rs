//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    InventoryStats, Product, ProductFilter, StockAction, UpdateProduct, MAX_STOCK,
};
use crate::repository::ProductRepository;

/// Collection holding one document per barcode.
pub const COLLECTION: &str = "products";

/// Stored shape of a product: the barcode is the `_id` and timestamps are BSON dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    barcode: String,
    name: String,
    category: String,
    cost: f64,
    stock: i64,
    min_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_scanned: Option<bson::DateTime>,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

impl From<Product> for ProductDocument {
    fn from(p: Product) -> Self {
        Self {
            barcode: p.barcode,
            name: p.name,
            category: p.category,
            cost: p.cost,
            stock: p.stock,
            min_stock: p.min_stock,
            last_scanned: p.last_scanned.map(to_bson_datetime),
            created_at: to_bson_datetime(p.created_at),
            updated_at: to_bson_datetime(p.updated_at),
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(d: ProductDocument) -> Self {
        Self {
            barcode: d.barcode,
            name: d.name,
            category: d.category,
            cost: d.cost,
            stock: d.stock,
            min_stock: d.min_stock,
            last_scanned: d.last_scanned.map(from_bson_datetime),
            created_at: from_bson_datetime(d.created_at),
            updated_at: from_bson_datetime(d.updated_at),
        }
    }
}

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository over the `products` collection
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<ProductDocument>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for the list, filter and distinct queries.
    ///
    /// Barcode uniqueness comes from `_id` and needs no extra index.
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            // Category filter + distinct
            IndexModel::builder()
                .keys(doc! { "category": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category".to_string())
                        .build(),
                )
                .build(),
            // List order
            IndexModel::builder()
                .keys(doc! { "updatedAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_updated_at".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    async fn find_and_update(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> ProductResult<Option<Product>> {
        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(Product::from))
    }
}

/// Build a MongoDB filter document from ProductFilter
fn build_filter(filter: &ProductFilter) -> Document {
    let mut doc = doc! {};

    if let Some(category) = filter.category() {
        doc.insert("category", category);
    }

    if filter.low_stock_only() {
        doc.insert("$expr", low_stock_expr());
    }

    doc
}

fn low_stock_expr() -> Document {
    doc! { "$lte": ["$stock", "$minStock"] }
}

/// Match the product only while the action keeps stock within [`MAX_STOCK`].
fn stock_update_filter(barcode: &str, action: StockAction, quantity: i64) -> Document {
    match action {
        StockAction::Increase => doc! {
            "_id": barcode,
            "stock": { "$lte": MAX_STOCK.saturating_sub(quantity) },
        },
        StockAction::Decrease | StockAction::Set => doc! { "_id": barcode },
    }
}

/// Update pipeline computing the new stock server-side.
fn stock_update_pipeline(action: StockAction, quantity: i64, at: DateTime<Utc>) -> Vec<Document> {
    let stock = match action {
        StockAction::Increase => Bson::Document(doc! { "$add": ["$stock", quantity] }),
        StockAction::Decrease => Bson::Document(doc! {
            "$max": [0_i64, { "$subtract": ["$stock", quantity] }]
        }),
        StockAction::Set => Bson::Document(doc! { "$literal": quantity }),
    };
    let at = to_bson_datetime(at);

    vec![doc! {
        "$set": {
            "stock": stock,
            "lastScanned": at,
            "updatedAt": at,
        }
    }]
}

/// `$set` document for the fields present in `changes`, plus the timestamps.
fn update_set(changes: &UpdateProduct, at: DateTime<Utc>) -> Document {
    let at = to_bson_datetime(at);
    let mut set = doc! { "lastScanned": at, "updatedAt": at };

    if let Some(ref name) = changes.name {
        set.insert("name", name.as_str());
    }
    if let Some(ref category) = changes.category {
        set.insert("category", category.as_str());
    }
    if let Some(cost) = changes.cost {
        set.insert("cost", cost);
    }
    if let Some(stock) = changes.stock {
        set.insert("stock", stock);
    }
    if let Some(min_stock) = changes.min_stock {
        set.insert("minStock", min_stock);
    }

    doc! { "$set": set }
}

fn stats_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": Bson::Null,
                "totalProducts": { "$sum": 1 },
                "totalValue": { "$sum": { "$multiply": ["$cost", "$stock"] } },
                "lowStockCount": {
                    "$sum": { "$cond": [low_stock_expr(), 1, 0] }
                },
                "categories": { "$addToSet": "$category" },
            }
        },
        doc! {
            "$project": {
                "_id": 0,
                "totalProducts": 1,
                "totalValue": { "$toDouble": "$totalValue" },
                "lowStockCount": 1,
                "categoriesCount": { "$size": "$categories" },
            }
        },
    ]
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn find_by_barcode(&self, barcode: &str) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(doc! { "_id": barcode }).await?;
        Ok(product.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn touch(&self, barcode: &str, at: DateTime<Utc>) -> ProductResult<Option<Product>> {
        self.find_and_update(
            doc! { "_id": barcode },
            doc! { "$set": { "lastScanned": to_bson_datetime(at) } },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn exists(&self, barcode: &str) -> ProductResult<bool> {
        let count = self
            .collection
            .count_documents(doc! { "_id": barcode })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self, product), fields(barcode = %product.barcode))]
    async fn insert(&self, product: Product) -> ProductResult<Product> {
        let document = ProductDocument::from(product.clone());

        self.collection
            .insert_one(&document)
            .await
            .map_err(|e| ProductError::from_insert(e, &product.barcode))?;

        tracing::info!(barcode = %product.barcode, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn update_stock(
        &self,
        barcode: &str,
        action: StockAction,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> ProductResult<Product> {
        let updated = self
            .find_and_update(
                stock_update_filter(barcode, action, quantity),
                stock_update_pipeline(action, quantity, at),
            )
            .await?;

        let product = match updated {
            Some(product) => product,
            None if action == StockAction::Increase && self.exists(barcode).await? => {
                return Err(ProductError::stock_limit(barcode));
            }
            None => return Err(ProductError::NotFound(barcode.to_string())),
        };

        tracing::info!(barcode, %action, quantity, stock = product.stock, "Stock updated");
        Ok(product)
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self,
        barcode: &str,
        changes: UpdateProduct,
        at: DateTime<Utc>,
    ) -> ProductResult<Product> {
        let product = self
            .find_and_update(doc! { "_id": barcode }, update_set(&changes, at))
            .await?
            .ok_or_else(|| ProductError::NotFound(barcode.to_string()))?;

        tracing::info!(barcode, "Product updated successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete(&self, barcode: &str) -> ProductResult<()> {
        let result = self.collection.delete_one(doc! { "_id": barcode }).await?;

        if result.deleted_count == 0 {
            return Err(ProductError::NotFound(barcode.to_string()));
        }

        tracing::info!(barcode, "Product deleted successfully");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let cursor = self
            .collection
            .find(build_filter(&filter))
            .sort(doc! { "updatedAt": -1, "_id": 1 })
            .await?;
        let documents: Vec<ProductDocument> = cursor.try_collect().await?;

        Ok(documents.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> ProductResult<Vec<String>> {
        let values = self.collection.distinct("category", doc! {}).await?;

        let mut categories: Vec<String> = values
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(s) => Some(s),
                _ => None,
            })
            .collect();
        categories.sort();
        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> ProductResult<InventoryStats> {
        let mut cursor = self.collection.aggregate(stats_pipeline()).await?;

        match cursor.try_next().await? {
            Some(row) => bson::from_document(row)
                .map_err(|e| ProductError::Database(format!("Malformed stats row: {e}"))),
            None => Ok(InventoryStats::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_ignores_empty_category_and_other_low_stock_values() {
        let filter = ProductFilter {
            category: Some(String::new()),
            low_stock: Some("false".into()),
        };
        assert_eq!(build_filter(&filter), doc! {});
    }

    #[test]
    fn test_build_filter_pushes_low_stock_into_query() {
        let filter = ProductFilter {
            category: Some("Stationery".into()),
            low_stock: Some("true".into()),
        };
        assert_eq!(
            build_filter(&filter),
            doc! {
                "category": "Stationery",
                "$expr": { "$lte": ["$stock", "$minStock"] },
            }
        );
    }

    #[test]
    fn test_decrease_pipeline_clamps_at_zero() {
        let at = Utc::now();
        let pipeline = stock_update_pipeline(StockAction::Decrease, 3, at);
        let set = pipeline[0].get_document("$set").unwrap();

        assert_eq!(
            set.get_document("stock").unwrap(),
            &doc! { "$max": [0_i64, { "$subtract": ["$stock", 3_i64] }] }
        );
        assert_eq!(set.get_datetime("updatedAt").unwrap(), &to_bson_datetime(at));
        assert_eq!(set.get_datetime("lastScanned").unwrap(), &to_bson_datetime(at));
    }

    #[test]
    fn test_increase_only_matches_below_stock_limit() {
        assert_eq!(
            stock_update_filter("123", StockAction::Increase, 20),
            doc! { "_id": "123", "stock": { "$lte": MAX_STOCK - 20 } }
        );
        assert_eq!(
            stock_update_filter("123", StockAction::Decrease, 20),
            doc! { "_id": "123" }
        );
        assert_eq!(
            stock_update_filter("123", StockAction::Set, 20),
            doc! { "_id": "123" }
        );
    }

    #[test]
    fn test_update_set_only_includes_present_fields() {
        let changes = UpdateProduct {
            name: Some("Gel Pen".into()),
            min_stock: Some(4),
            ..Default::default()
        };
        let update = update_set(&changes, Utc::now());
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("name").unwrap(), "Gel Pen");
        assert_eq!(set.get_i64("minStock").unwrap(), 4);
        assert!(!set.contains_key("category"));
        assert!(!set.contains_key("cost"));
        assert!(!set.contains_key("barcode"));
        assert!(!set.contains_key("_id"));
    }

    #[test]
    fn test_document_conversion_keeps_millisecond_timestamps() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let product = Product {
            barcode: "123".into(),
            name: "Pen".into(),
            category: "Stationery".into(),
            cost: 10.0,
            stock: 5,
            min_stock: 10,
            last_scanned: None,
            created_at: at,
            updated_at: at,
        };

        let stored = bson::to_document(&ProductDocument::from(product.clone())).unwrap();
        assert_eq!(stored.get_str("_id").unwrap(), "123");
        assert!(stored.get_datetime("createdAt").is_ok());
        assert!(!stored.contains_key("lastScanned"));

        let back: ProductDocument = bson::from_document(stored).unwrap();
        assert_eq!(Product::from(back), product);
    }

    #[test]
    fn test_stats_row_deserializes_mixed_numeric_types() {
        let row = doc! {
            "totalProducts": 2_i32,
            "totalValue": 150.0,
            "lowStockCount": 1_i64,
            "categoriesCount": 2_i32,
        };
        let stats: InventoryStats = bson::from_document(row).unwrap();
        assert_eq!(
            stats,
            InventoryStats {
                total_products: 2,
                total_value: 150.0,
                low_stock_count: 1,
                categories_count: 2,
            }
        );
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_stock_roundtrip_against_server() {
        use crate::models::CreateProduct;

        let url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = mongodb::Client::with_uri_str(&url).await.unwrap();
        let db = client.database("inventory_test");
        let repo = MongoProductRepository::with_collection(&db, "products_repo_test");
        repo.collection.drop().await.unwrap();
        repo.init_indexes().await.unwrap();

        let now = Utc::now();
        let pen = Product::new(
            CreateProduct {
                barcode: "123".into(),
                name: "Pen".into(),
                category: "Stationery".into(),
                cost: 10.0,
                stock: 5,
                min_stock: 10,
            },
            now,
        );
        repo.insert(pen.clone()).await.unwrap();
        assert!(matches!(
            repo.insert(pen).await.unwrap_err(),
            ProductError::DuplicateBarcode(_)
        ));

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_value, 50.0);
        assert_eq!(stats.low_stock_count, 1);

        let updated = repo
            .update_stock("123", StockAction::Decrease, 8, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.stock, 0);

        let low = repo
            .list(ProductFilter {
                category: None,
                low_stock: Some("true".into()),
            })
            .await
            .unwrap();
        assert_eq!(low.len(), 1);

        repo.delete("123").await.unwrap();
        assert_eq!(repo.stats().await.unwrap(), InventoryStats::default());
    }
}
