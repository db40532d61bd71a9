//! QR code rasterisation and image embedding
//!
//! The symbol is rendered to a temporary PNG file, decoded back into raw
//! samples and embedded as a Flate-compressed image XObject. The temporary
//! file is removed when its handle drops, whichever way the call returns.

use crate::error::PdfFormError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Stream};
use qrcode::{Color, QrCode};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Quiet zone around the symbol, in modules
const QUIET_ZONE: usize = 4;
/// Pixels per module
const MODULE_SCALE: usize = 4;

/// Value encoded when a qrcode field has none
pub const DEFAULT_QR_VALUE: &str = "12345";

/// Decoded raster samples, 8 bits per component
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub samples: Vec<u8>,
}

impl RasterImage {
    fn color_space(&self) -> &'static str {
        if self.components == 1 {
            "DeviceGray"
        } else {
            "DeviceRGB"
        }
    }

    /// An image XObject holding these samples
    pub fn to_xobject(&self) -> Result<Stream, PdfFormError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.samples)?;
        let compressed = encoder.finish()?;

        let mut stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(self.width),
                "Height" => i64::from(self.height),
                "ColorSpace" => self.color_space(),
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        );
        // Already deflated; keep `Document::compress` from touching it.
        stream.allows_compression = false;
        Ok(stream)
    }
}

/// Rasterise `value` as a QR symbol through a temporary PNG created in `dir`
pub fn qr_image_in(value: &str, dir: &Path) -> Result<RasterImage, PdfFormError> {
    let temp = tempfile::Builder::new()
        .prefix("pdfform-qr-")
        .suffix(".png")
        .tempfile_in(dir)?;

    write_qr_png(value, temp.as_file())?;
    let image = read_png(temp.path())?;
    debug!(
        "QR code for {} chars: {}x{} px via {}",
        value.chars().count(),
        image.width,
        image.height,
        temp.path().display()
    );
    Ok(image)
}

fn write_qr_png(value: &str, file: &File) -> Result<(), PdfFormError> {
    let code = QrCode::new(value.as_bytes())
        .map_err(|e| PdfFormError::FieldRender(format!("Cannot encode QR code: {}", e)))?;

    let modules = code.width();
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * MODULE_SCALE;

    let mut pixels = vec![0xFFu8; side * side];
    for (index, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let (module_x, module_y) = (index % modules, index / modules);
        let left = (module_x + QUIET_ZONE) * MODULE_SCALE;
        let top = (module_y + QUIET_ZONE) * MODULE_SCALE;
        for row in top..top + MODULE_SCALE {
            pixels[row * side + left..row * side + left + MODULE_SCALE].fill(0);
        }
    }

    let mut encoder = png::Encoder::new(BufWriter::new(file), side as u32, side as u32);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| PdfFormError::OperationError(format!("PNG encode failed: {}", e)))?;
    writer
        .write_image_data(&pixels)
        .map_err(|e| PdfFormError::OperationError(format!("PNG encode failed: {}", e)))?;
    writer
        .finish()
        .map_err(|e| PdfFormError::OperationError(format!("PNG encode failed: {}", e)))?;
    Ok(())
}

/// Decode a PNG into 8-bit gray or RGB samples; alpha is dropped
pub fn read_png(path: &Path) -> Result<RasterImage, PdfFormError> {
    let mut decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| PdfFormError::ParseError(format!("PNG decode failed: {}", e)))?;

    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buffer)
        .map_err(|e| PdfFormError::ParseError(format!("PNG decode failed: {}", e)))?;
    buffer.truncate(frame.buffer_size());

    let (components, samples) = match frame.color_type {
        png::ColorType::Grayscale => (1, buffer),
        png::ColorType::Rgb => (3, buffer),
        png::ColorType::GrayscaleAlpha => (1, buffer.chunks_exact(2).map(|px| px[0]).collect()),
        png::ColorType::Rgba => (
            3,
            buffer
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
        ),
        png::ColorType::Indexed => {
            return Err(PdfFormError::ParseError(
                "PNG palette was not expanded".into(),
            ))
        }
    };

    Ok(RasterImage {
        width: frame.width,
        height: frame.height,
        components,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    #[test]
    fn test_qr_image_dimensions_include_quiet_zone() {
        let dir = tempfile::tempdir().unwrap();
        let image = qr_image_in("12345", dir.path()).unwrap();

        // "12345" fits a version 1 symbol: 21 modules.
        let expected = ((21 + 2 * QUIET_ZONE) * MODULE_SCALE) as u32;
        assert_eq!(image.width, expected);
        assert_eq!(image.height, expected);
        assert_eq!(image.components, 1);
        assert_eq!(image.samples.len(), (expected * expected) as usize);
        // Quiet zone is white, finder pattern corner is black.
        assert_eq!(image.samples[0], 0xFF);
        let corner = (QUIET_ZONE * MODULE_SCALE) as u32;
        assert_eq!(image.samples[(corner * expected + corner) as usize], 0);
    }

    #[test]
    fn test_temp_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        qr_image_in("https://example.com/doc/42", dir.path()).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_temp_file_is_removed_on_error() {
        let dir = tempfile::tempdir().unwrap();
        // Beyond the capacity of the largest symbol.
        let oversized = "x".repeat(8000);
        let err = qr_image_in(&oversized, dir.path()).unwrap_err();
        assert!(matches!(err, PdfFormError::FieldRender(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_xobject_stream_inflates_to_samples() {
        let image = RasterImage {
            width: 2,
            height: 1,
            components: 1,
            samples: vec![0, 255],
        };
        let stream = image.to_xobject().unwrap();
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 2);

        let mut inflated = Vec::new();
        ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut inflated)
            .unwrap();
        assert_eq!(inflated, vec![0, 255]);
    }
}
