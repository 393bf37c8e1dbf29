//! HTTP handlers for the inventory API
//!
//! The router carries the `/products`, `/categories` and `/stats` routes and is
//! meant to be nested under `/api`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, put},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        NotFoundResponse,
    },
    ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{
    BarcodeLookup, CreateProduct, DeleteResult, InventoryStats, Product, ProductEnvelope,
    ProductFilter, StockAction, StockUpdate, UpdateProduct,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for the inventory endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        lookup_barcode,
        create_product,
        update_stock,
        update_product,
        list_products,
        list_categories,
        delete_product,
        get_stats,
    ),
    components(
        schemas(
            Product, CreateProduct, UpdateProduct, ProductFilter, StockAction,
            StockUpdate, BarcodeLookup, ProductEnvelope, DeleteResult, InventoryStats
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Barcode lookup and product management"),
        (name = "Inventory", description = "Categories and dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the inventory router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/barcode/{barcode}", get(lookup_barcode))
        .route(
            "/products/{barcode}",
            put(update_product).delete(delete_product),
        )
        .route("/products/{barcode}/stock", patch(update_stock))
        .route("/categories", get(list_categories))
        .route("/stats", get(get_stats))
        .with_state(shared_service)
}

/// Look up a scanned barcode
///
/// A hit also records the scan time in `lastScanned`.
#[utoipa::path(
    get,
    path = "/products/barcode/{barcode}",
    tag = "Products",
    params(
        ("barcode" = String, Path, description = "Scanned barcode")
    ),
    responses(
        (status = 200, description = "Lookup result; `exists` tells whether the barcode is registered", body = BarcodeLookup),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn lookup_barcode<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(barcode): Path<String>,
) -> ProductResult<Json<BarcodeLookup>> {
    let lookup = service.lookup(&barcode).await?;
    Ok(Json(lookup))
}

/// Register a new product
#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = ProductEnvelope),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(ProductEnvelope::from(product))))
}

/// Increase, decrease or set a product's stock
#[utoipa::path(
    patch,
    path = "/products/{barcode}/stock",
    tag = "Products",
    params(
        ("barcode" = String, Path, description = "Product barcode")
    ),
    request_body = StockUpdate,
    responses(
        (status = 200, description = "Stock updated", body = ProductEnvelope),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_stock<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(barcode): Path<String>,
    ValidatedJson(update): ValidatedJson<StockUpdate>,
) -> ProductResult<Json<ProductEnvelope>> {
    let product = service.update_stock(&barcode, update).await?;
    Ok(Json(product.into()))
}

/// Update a product's details
#[utoipa::path(
    put,
    path = "/products/{barcode}",
    tag = "Products",
    params(
        ("barcode" = String, Path, description = "Product barcode")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = ProductEnvelope),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(barcode): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<ProductEnvelope>> {
    let product = service.update_product(&barcode, input).await?;
    Ok(Json(product.into()))
}

/// List products, most recently updated first
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    params(ProductFilter),
    responses(
        (status = 200, description = "List of products", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Query(filter): Query<ProductFilter>,
) -> ProductResult<Json<Vec<Product>>> {
    let products = service.list_products(filter).await?;
    Ok(Json(products))
}

/// Distinct categories, sorted
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Inventory",
    responses(
        (status = 200, description = "Categories in use", body = Vec<String>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<Json<Vec<String>>> {
    let categories = service.categories().await?;
    Ok(Json(categories))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/products/{barcode}",
    tag = "Products",
    params(
        ("barcode" = String, Path, description = "Product barcode")
    ),
    responses(
        (status = 200, description = "Product deleted", body = DeleteResult),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(barcode): Path<String>,
) -> ProductResult<Json<DeleteResult>> {
    service.delete_product(&barcode).await?;
    Ok(Json(DeleteResult::deleted()))
}

/// Inventory statistics for the dashboard
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Inventory",
    responses(
        (status = 200, description = "Aggregate counters", body = InventoryStats),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_stats<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<Json<InventoryStats>> {
    let stats = service.stats().await?;
    Ok(Json(stats))
}
