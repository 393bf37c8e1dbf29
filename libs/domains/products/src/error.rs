use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::models::MAX_STOCK;

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Product already exists: {0}")]
    DuplicateBarcode(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid input")]
    InvalidFields(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => AppError::NotFound("Product not found".to_string()),
            ProductError::DuplicateBarcode(_) => {
                AppError::Conflict("Product already exists".to_string())
            }
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::InvalidFields(errors) => AppError::ValidationError(errors),
            ProductError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl ProductError {
    /// An increase on `barcode` would take its stock past [`MAX_STOCK`].
    pub fn stock_limit(barcode: &str) -> Self {
        tracing::debug!(barcode, "Stock increase rejected at limit");
        ProductError::Validation(format!(
            "quantity: increase would take stock above {MAX_STOCK}"
        ))
    }

    /// Map a driver error from an insert, turning a duplicate `_id` into
    /// [`ProductError::DuplicateBarcode`].
    pub fn from_insert(err: mongodb::error::Error, barcode: &str) -> Self {
        if is_duplicate_key(&err) {
            ProductError::DuplicateBarcode(barcode.to_string())
        } else {
            err.into()
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::InsertMany(e) => e
            .write_errors
            .as_ref()
            .is_some_and(|errs| errs.iter().any(|e| e.code == DUPLICATE_KEY)),
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ProductError::NotFound("1".into()), StatusCode::NOT_FOUND),
            (
                ProductError::DuplicateBarcode("1".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ProductError::Validation("Invalid action".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ProductError::Database("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_non_write_error_is_database_error() {
        let err = mongodb::error::Error::custom("socket closed");
        assert!(matches!(
            ProductError::from_insert(err, "123"),
            ProductError::Database(_)
        ));
    }
}
