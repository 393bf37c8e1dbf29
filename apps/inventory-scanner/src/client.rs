//! HTTP client for the inventory API

use domain_products::{
    BarcodeLookup, CreateProduct, DeleteResult, InventoryStats, Product, ProductEnvelope,
    ProductFilter, StockAction, StockUpdate, UpdateProduct,
};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid API URL '{0}'")]
    InvalidUrl(String),

    #[error("Cannot reach inventory API: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error envelope
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl ClientError {
    /// Machine-readable error code from the API envelope, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// `{ "error": ..., "code": ... }`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    code: Option<String>,
}

/// Typed client over the `/api` routes.
#[derive(Clone, Debug)]
pub struct InventoryClient {
    base: Url,
    http: Client,
}

impl InventoryClient {
    /// `base_url` includes the `/api` prefix, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base = Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base,
            http: Client::new(),
        })
    }

    /// Join path segments onto the base, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    #[instrument(skip(self))]
    pub async fn lookup(&self, barcode: &str) -> ClientResult<BarcodeLookup> {
        let url = self.endpoint(&["products", "barcode", barcode])?;
        read(self.http.get(url).send().await?).await
    }

    #[instrument(skip(self, input), fields(barcode = %input.barcode))]
    pub async fn create_product(&self, input: &CreateProduct) -> ClientResult<Product> {
        let url = self.endpoint(&["products"])?;
        let envelope: ProductEnvelope = read(self.http.post(url).json(input).send().await?).await?;
        Ok(envelope.product)
    }

    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        barcode: &str,
        action: StockAction,
        quantity: i64,
    ) -> ClientResult<Product> {
        let url = self.endpoint(&["products", barcode, "stock"])?;
        let body = StockUpdate::new(action, quantity);
        let envelope: ProductEnvelope = read(self.http.patch(url).json(&body).send().await?).await?;
        Ok(envelope.product)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        barcode: &str,
        changes: &UpdateProduct,
    ) -> ClientResult<Product> {
        let url = self.endpoint(&["products", barcode])?;
        let envelope: ProductEnvelope = read(self.http.put(url).json(changes).send().await?).await?;
        Ok(envelope.product)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, barcode: &str) -> ClientResult<DeleteResult> {
        let url = self.endpoint(&["products", barcode])?;
        read(self.http.delete(url).send().await?).await
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> ClientResult<Vec<Product>> {
        let url = self.endpoint(&["products"])?;
        read(self.http.get(url).query(filter).send().await?).await
    }

    pub async fn categories(&self) -> ClientResult<Vec<String>> {
        let url = self.endpoint(&["categories"])?;
        read(self.http.get(url).send().await?).await
    }

    pub async fn stats(&self) -> ClientResult<InventoryStats> {
        let url = self.endpoint(&["stats"])?;
        read(self.http.get(url).send().await?).await
    }
}

async fn read<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let (code, message) = match response.json::<ApiErrorBody>().await {
        Ok(body) => (body.code, body.error),
        Err(_) => (None, format!("Server error: {}", status.as_u16())),
    };
    debug!(status = status.as_u16(), ?code, %message, "API request failed");

    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
