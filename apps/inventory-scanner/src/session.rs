//! Scan flow state machine
//!
//! ```text
//! Idle ─start─▶ Scanning ─decode─▶ Decoded ─lookup─▶ Existing | NewProduct
//!   ▲              │                                     │
//!   └───cancel─────┴─────────────────────────────────────┘
//! ```

use domain_products::{BarcodeLookup, CreateProduct, Product, StockAction, UpdateProduct};
use thiserror::Error;
use tracing::{info, instrument};

use crate::capture::{CaptureDevice, CaptureError, CaptureSession};
use crate::client::{ClientError, InventoryClient};
use crate::dashboard::Dashboard;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("No product is open")]
    NoProduct,

    #[error("No new barcode is waiting to be registered")]
    NoPendingBarcode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Idle,
    Scanning,
    Decoded(String),
    /// Detail view of a registered product
    Existing(Product),
    /// Creation form for an unknown barcode
    NewProduct(String),
}

/// Per-user scan state. Passed explicitly to every operation.
#[derive(Debug, Clone)]
pub struct ScanSession {
    state: ScanState,
    show_low_stock: bool,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
            show_low_stock: false,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Product shown in the detail view
    pub fn current_product(&self) -> Option<&Product> {
        match &self.state {
            ScanState::Existing(product) => Some(product),
            _ => None,
        }
    }

    pub fn show_low_stock(&self) -> bool {
        self.show_low_stock
    }

    /// Flip the list filter and reload the dashboard with it.
    pub async fn toggle_low_stock(
        &mut self,
        client: &InventoryClient,
        dashboard: &mut Dashboard,
    ) -> Result<bool, ScanError> {
        self.show_low_stock = !self.show_low_stock;
        dashboard.refresh(client, self.show_low_stock).await?;
        Ok(self.show_low_stock)
    }

    pub fn cancel(&mut self) {
        self.state = ScanState::Idle;
    }

    /// Capture one barcode and resolve it against the API.
    ///
    /// The device is released before the lookup runs. Cancellation and any
    /// failure leave the session in `Idle`.
    #[instrument(skip_all, fields(device = device.name()))]
    pub async fn scan<D: CaptureDevice + ?Sized>(
        &mut self,
        device: &mut D,
        client: &InventoryClient,
    ) -> Result<&ScanState, ScanError> {
        self.state = ScanState::Scanning;

        let captured = match CaptureSession::start(device) {
            Ok(mut capture) => capture.next_code(),
            Err(e) => Err(e),
        };

        let barcode = match captured {
            Ok(Some(code)) => code,
            Ok(None) => {
                self.cancel();
                return Ok(&self.state);
            }
            Err(e) => {
                self.cancel();
                return Err(e.into());
            }
        };

        info!(%barcode, "Barcode decoded");
        self.state = ScanState::Decoded(barcode.clone());
        self.open(&barcode, client).await
    }

    /// Resolve a barcode without capturing, as when picking from the list.
    pub async fn open(
        &mut self,
        barcode: &str,
        client: &InventoryClient,
    ) -> Result<&ScanState, ScanError> {
        match client.lookup(barcode).await {
            Ok(BarcodeLookup::Found { product, .. }) => {
                self.state = ScanState::Existing(product);
            }
            Ok(BarcodeLookup::Missing { barcode, .. }) => {
                self.state = ScanState::NewProduct(barcode);
            }
            Err(e) => {
                self.cancel();
                return Err(e.into());
            }
        }
        Ok(&self.state)
    }

    /// Register the barcode waiting in the creation form.
    ///
    /// `input.barcode` is replaced with the scanned one.
    pub async fn create(
        &mut self,
        mut input: CreateProduct,
        client: &InventoryClient,
        dashboard: &mut Dashboard,
    ) -> Result<&Product, ScanError> {
        let ScanState::NewProduct(barcode) = &self.state else {
            return Err(ScanError::NoPendingBarcode);
        };
        input.barcode = barcode.clone();

        let product = client.create_product(&input).await?;
        info!(barcode = %product.barcode, "Product registered");
        self.finish_mutation(product, client, dashboard).await
    }

    pub async fn adjust_stock(
        &mut self,
        action: StockAction,
        quantity: i64,
        client: &InventoryClient,
        dashboard: &mut Dashboard,
    ) -> Result<&Product, ScanError> {
        let barcode = self.current_barcode()?;
        let product = client.update_stock(&barcode, action, quantity).await?;
        self.finish_mutation(product, client, dashboard).await
    }

    pub async fn edit(
        &mut self,
        changes: &UpdateProduct,
        client: &InventoryClient,
        dashboard: &mut Dashboard,
    ) -> Result<&Product, ScanError> {
        let barcode = self.current_barcode()?;
        let product = client.update_product(&barcode, changes).await?;
        self.finish_mutation(product, client, dashboard).await
    }

    /// Delete the open product and return to `Idle`.
    pub async fn delete(
        &mut self,
        client: &InventoryClient,
        dashboard: &mut Dashboard,
    ) -> Result<(), ScanError> {
        let barcode = self.current_barcode()?;
        client.delete_product(&barcode).await?;
        info!(%barcode, "Product deleted");

        self.cancel();
        dashboard.refresh(client, self.show_low_stock).await?;
        Ok(())
    }

    fn current_barcode(&self) -> Result<String, ScanError> {
        self.current_product()
            .map(|p| p.barcode.clone())
            .ok_or(ScanError::NoProduct)
    }

    async fn finish_mutation(
        &mut self,
        product: Product,
        client: &InventoryClient,
        dashboard: &mut Dashboard,
    ) -> Result<&Product, ScanError> {
        self.state = ScanState::Existing(product);
        dashboard.refresh(client, self.show_low_stock).await?;
        self.current_product().ok_or(ScanError::NoProduct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = ScanSession::new();
        assert_eq!(session.state(), &ScanState::Idle);
        assert!(session.current_product().is_none());
        assert!(!session.show_low_stock());
    }

    #[tokio::test]
    async fn test_cancelled_capture_returns_to_idle_without_lookup() {
        use crate::capture::ScriptedCapture;

        // Nothing listens here; a lookup would fail
        let client = InventoryClient::new("http://127.0.0.1:9/api").unwrap();
        let mut device = ScriptedCapture::default().then_cancel();
        let mut session = ScanSession::new();

        let state = session.scan(&mut device, &client).await.unwrap();

        assert_eq!(state, &ScanState::Idle);
        assert!(!device.is_open());
    }

    #[tokio::test]
    async fn test_mutations_need_an_open_product() {
        let client = InventoryClient::new("http://127.0.0.1:9/api").unwrap();
        let mut dashboard = Dashboard::default();
        let mut session = ScanSession::new();

        let err = session
            .adjust_stock(StockAction::Increase, 1, &client, &mut dashboard)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::NoProduct));

        let input = CreateProduct {
            barcode: String::new(),
            name: "Pen".into(),
            category: "Stationery".into(),
            cost: 1.0,
            stock: 0,
            min_stock: 10,
        };
        let err = session
            .create(input, &client, &mut dashboard)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::NoPendingBarcode));
    }
}
