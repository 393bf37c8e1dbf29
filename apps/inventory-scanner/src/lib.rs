//! Barcode scanner client for the inventory API
//!
//! - [`capture`]: capture devices and the scoped [`capture::CaptureSession`]
//! - [`decode`]: image decoding for [`capture::ImageUpload`]
//! - [`client`]: typed HTTP client over `/api`
//! - [`session`]: the scan flow state machine
//! - [`dashboard`]: product list, categories and statistics
//! - [`interactive`]: the terminal scan loop

pub mod capture;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod decode;
pub mod interactive;
pub mod prompt;
pub mod session;

pub use capture::{
    BarcodeDecoder, CaptureDevice, CaptureError, CaptureSession, ImageUpload, KeyboardWedge,
    ScriptedCapture,
};
pub use client::{ClientError, ClientResult, InventoryClient};
pub use config::ScannerConfig;
pub use dashboard::Dashboard;
pub use decode::RxingDecoder;
pub use session::{ScanError, ScanSession, ScanState};
