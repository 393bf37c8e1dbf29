//! Barcode decoding for uploaded images

use rxing::helpers::detect_in_luma;

use crate::capture::BarcodeDecoder;

/// Reads 1D (EAN, UPC, Code 128...) and 2D (QR, Data Matrix...) symbols
/// from PNG, JPEG, GIF, BMP or WebP bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RxingDecoder;

impl BarcodeDecoder for RxingDecoder {
    fn decode(&self, image: &[u8]) -> Option<String> {
        let luma = match image::load_from_memory(image) {
            Ok(decoded) => decoded.to_luma8(),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable image");
                return None;
            }
        };

        let (width, height) = luma.dimensions();
        match detect_in_luma(luma.into_raw(), width, height, None) {
            Ok(result) => Some(result.getText().to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "No barcode in image");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
    use std::io::Cursor;

    fn qr_png(contents: &str) -> Vec<u8> {
        let matrix = MultiFormatWriter::default()
            .encode(contents, &BarcodeFormat::QR_CODE, 240, 240)
            .unwrap();
        let img = GrayImage::from_fn(matrix.getWidth(), matrix.getHeight(), |x, y| {
            Luma([if matrix.get(x, y) { 0 } else { 255 }])
        });

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        png
    }

    #[test]
    fn test_decodes_qr_code() {
        let png = qr_png("4006381333931");
        assert_eq!(RxingDecoder.decode(&png).as_deref(), Some("4006381333931"));
    }

    #[test]
    fn test_blank_image_has_no_barcode() {
        let mut png = Vec::new();
        GrayImage::from_pixel(64, 64, Luma([255]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        assert_eq!(RxingDecoder.decode(&png), None);
    }

    #[test]
    fn test_non_image_bytes_are_rejected() {
        assert_eq!(RxingDecoder.decode(b"not an image"), None);
    }
}
