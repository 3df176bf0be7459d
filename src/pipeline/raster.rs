//! Image → image and image → icon.
//!
//! ## ICO container
//!
//! Modern ICO files may embed a PNG directly. The container written here is
//! the minimal single-entry form: a 6-byte `ICONDIR`, one 16-byte
//! `ICONDIRENTRY`, then the PNG. All integers are little-endian.
//!
//! ```text
//! off  len  field
//!   0    2  reserved = 0
//!   2    2  type     = 1 (icon)
//!   4    2  count    = 1
//!   6    1  width    (0 means 256)
//!   7    1  height   (0 means 256)
//!   8    1  colours  = 0
//!   9    1  reserved = 0
//!  10    2  planes   = 1
//!  12    2  bpp      = 32
//!  14    4  PNG length
//!  18    4  PNG offset = 22
//! ```

use super::Artifact;
use crate::backend::{Backends, RasterFormat};
use crate::error::FileError;
use crate::format::{replace_ext, OutputFormat};
use tracing::debug;

/// Bytes before the embedded PNG.
pub const ICO_HEADER_LEN: usize = 22;

/// The raster encoding behind a plain image target.
pub fn raster_format(format: OutputFormat) -> Option<RasterFormat> {
    match format {
        OutputFormat::Png => Some(RasterFormat::Png),
        OutputFormat::Jpeg => Some(RasterFormat::Jpeg),
        OutputFormat::Webp => Some(RasterFormat::Webp),
        _ => None,
    }
}

/// Decode at native size and re-encode as `format`.
pub fn image_to_image(
    backends: &Backends,
    name: &str,
    bytes: &[u8],
    format: RasterFormat,
    quality: f32,
) -> Result<Artifact, FileError> {
    let image = backends.raster.decode(bytes)?;
    let encoded = backends.raster.encode(&image, format, quality)?;
    debug!(
        "{}: {}x{} → {} ({} bytes)",
        name,
        image.width(),
        image.height(),
        format.extension(),
        encoded.len()
    );

    Ok(Artifact {
        file_name: replace_ext(name, &format!(".{}", format.extension())),
        bytes: encoded,
    })
}

/// Resample to `size`², encode PNG, wrap in a single-entry ICO.
pub fn image_to_ico(
    backends: &Backends,
    name: &str,
    bytes: &[u8],
    size: u32,
) -> Result<Artifact, FileError> {
    let image = backends.raster.decode(bytes)?;
    let icon = backends.raster.resize_exact(&image, size, size);
    let png = backends.raster.encode(&icon, RasterFormat::Png, 1.0)?;
    let png_len = u32::try_from(png.len())
        .map_err(|_| FileError::render("icon image exceeds 4 GiB"))?;

    let mut ico = Vec::with_capacity(ICO_HEADER_LEN + png.len());
    ico.extend_from_slice(&ico_header(size, png_len));
    ico.extend_from_slice(&png);
    debug!("{}: {}px icon, {} bytes", name, size, ico.len());

    Ok(Artifact {
        file_name: replace_ext(name, ".ico"),
        bytes: ico,
    })
}

/// The 22-byte header for one PNG entry of `size`² pixels.
pub fn ico_header(size: u32, png_len: u32) -> [u8; ICO_HEADER_LEN] {
    let dim = if size >= 256 { 0 } else { size as u8 };
    let mut header = [0u8; ICO_HEADER_LEN];
    header[2..4].copy_from_slice(&1u16.to_le_bytes());
    header[4..6].copy_from_slice(&1u16.to_le_bytes());
    header[6] = dim;
    header[7] = dim;
    header[10..12].copy_from_slice(&1u16.to_le_bytes());
    header[12..14].copy_from_slice(&32u16.to_le_bytes());
    header[14..18].copy_from_slice(&png_len.to_le_bytes());
    header[18..22].copy_from_slice(&(ICO_HEADER_LEN as u32).to_le_bytes());
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([10, 200, 30, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn header_layout_for_32px() {
        let h = ico_header(32, 0x0102_0304);
        assert_eq!(&h[0..6], &[0, 0, 1, 0, 1, 0]);
        assert_eq!(h[6], 32);
        assert_eq!(h[7], 32);
        assert_eq!(&h[8..14], &[0, 0, 1, 0, 32, 0]);
        assert_eq!(&h[14..18], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&h[18..22], &[22, 0, 0, 0]);
    }

    #[test]
    fn header_encodes_256_as_zero() {
        let h = ico_header(256, 10);
        assert_eq!((h[6], h[7]), (0, 0));
    }

    #[test]
    fn jpeg_output_name_and_signature() {
        let backends = Backends::default();
        let out = image_to_image(&backends, "photo.PNG", &png_bytes(4, 3), RasterFormat::Jpeg, 0.92)
            .unwrap();
        assert_eq!(out.file_name, "photo.jpg");
        assert_eq!(&out.bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn ico_wraps_a_resized_png() {
        let backends = Backends::default();
        let out = image_to_ico(&backends, "logo.webp", &png_bytes(50, 20), 32).unwrap();
        assert_eq!(out.file_name, "logo.ico");

        let png = &out.bytes[ICO_HEADER_LEN..];
        let len = u32::from_le_bytes(out.bytes[14..18].try_into().unwrap());
        assert_eq!(len as usize, png.len());
        let decoded = image::load_from_memory(png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
    }

    #[test]
    fn corrupt_input_is_decode_failure() {
        let err = image_to_image(&Backends::default(), "x.png", b"nope", RasterFormat::Png, 1.0)
            .unwrap_err();
        assert!(matches!(err, FileError::DecodeFailure { .. }));
    }

    #[test]
    fn raster_formats() {
        assert_eq!(raster_format(OutputFormat::Webp), Some(RasterFormat::Webp));
        assert_eq!(raster_format(OutputFormat::Pdf), None);
    }
}
