//! Barcode capture sources
//!
//! A [`CaptureDevice`] is only used through a [`CaptureSession`], which opens
//! the device when created and closes it when dropped. The session holds the
//! device by `&mut`, so a device can have at most one active session.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture device '{0}' is already in use")]
    Busy(String),

    #[error("Could not read barcode from image")]
    NoBarcode,

    #[error("Capture I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A source of decoded barcodes.
pub trait CaptureDevice {
    fn name(&self) -> &str;

    /// Acquire the underlying resource.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Block until a code is captured. `Ok(None)` means the user cancelled.
    fn read_code(&mut self) -> Result<Option<String>, CaptureError>;

    /// Release the underlying resource. Must not fail.
    fn close(&mut self);
}

/// Scoped acquisition of a capture device.
pub struct CaptureSession<'a, D: CaptureDevice + ?Sized> {
    device: &'a mut D,
}

impl<'a, D: CaptureDevice + ?Sized> CaptureSession<'a, D> {
    pub fn start(device: &'a mut D) -> Result<Self, CaptureError> {
        device.open()?;
        debug!(device = device.name(), "Capture started");
        Ok(Self { device })
    }

    pub fn next_code(&mut self) -> Result<Option<String>, CaptureError> {
        self.device.read_code()
    }
}

impl<D: CaptureDevice + ?Sized> Drop for CaptureSession<'_, D> {
    fn drop(&mut self) {
        self.device.close();
        debug!(device = self.device.name(), "Capture released");
    }
}

/// Hand-held scanners that type the code followed by Enter. Also covers
/// manual entry. An empty line or end of input cancels.
pub struct KeyboardWedge<R: BufRead> {
    input: R,
}

impl<R: BufRead> KeyboardWedge<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> CaptureDevice for KeyboardWedge<R> {
    fn name(&self) -> &str {
        "keyboard"
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn read_code(&mut self) -> Result<Option<String>, CaptureError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let code = line.trim();
        Ok((!code.is_empty()).then(|| code.to_string()))
    }

    fn close(&mut self) {}
}

/// Decodes a barcode from raw image bytes.
///
/// Implementations wrap an external decoding library.
pub trait BarcodeDecoder {
    fn decode(&self, image: &[u8]) -> Option<String>;
}

/// Decodes a barcode from an uploaded image file.
pub struct ImageUpload<D: BarcodeDecoder> {
    decoder: D,
    pending: Option<PathBuf>,
    busy: bool,
}

impl<D: BarcodeDecoder> ImageUpload<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            pending: None,
            busy: false,
        }
    }

    /// Queue the image read by the next capture.
    pub fn select(&mut self, path: impl AsRef<Path>) {
        self.pending = Some(path.as_ref().to_path_buf());
    }
}

impl<D: BarcodeDecoder> CaptureDevice for ImageUpload<D> {
    fn name(&self) -> &str {
        "image-upload"
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        if self.busy {
            return Err(CaptureError::Busy(self.name().to_string()));
        }
        self.busy = true;
        Ok(())
    }

    fn read_code(&mut self) -> Result<Option<String>, CaptureError> {
        let Some(path) = self.pending.take() else {
            return Ok(None);
        };

        let image = std::fs::read(&path)?;
        self.decoder
            .decode(&image)
            .map(Some)
            .ok_or(CaptureError::NoBarcode)
    }

    fn close(&mut self) {
        self.busy = false;
    }
}

/// Replays a fixed sequence of codes. `None` entries act as a cancel.
#[derive(Debug, Default)]
pub struct ScriptedCapture {
    codes: VecDeque<Option<String>>,
    open: bool,
    sessions: usize,
}

impl ScriptedCapture {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(|c| Some(c.into())).collect(),
            ..Default::default()
        }
    }

    /// Append a cancellation to the script.
    pub fn then_cancel(mut self) -> Self {
        self.codes.push_back(None);
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of sessions opened so far
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    pub fn remaining(&self) -> usize {
        self.codes.len()
    }
}

impl CaptureDevice for ScriptedCapture {
    fn name(&self) -> &str {
        "scripted"
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        if self.open {
            return Err(CaptureError::Busy(self.name().to_string()));
        }
        self.open = true;
        self.sessions += 1;
        Ok(())
    }

    fn read_code(&mut self) -> Result<Option<String>, CaptureError> {
        Ok(self.codes.pop_front().flatten())
    }

    fn close(&mut self) {
        self.open = false;
    }
}
