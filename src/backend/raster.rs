//! Raster codec backed by the `image` crate.
//!
//! JPEG has no alpha channel, so inputs are flattened to RGB before the
//! lossy encoder sees them. WEBP is written with the lossless encoder (the
//! only one the crate ships), which is why quality does not apply to it.

use super::{RasterCodec, RasterFormat};
use crate::error::FileError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// [`RasterCodec`] over the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

/// Map a `(0, 1]` quality to the encoder's 1–100 scale.
pub(crate) fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

impl RasterCodec for ImageCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, FileError> {
        let image = image::load_from_memory(bytes).map_err(FileError::decode)?;
        debug!("Decoded image: {}x{} px", image.width(), image.height());
        Ok(image)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: RasterFormat,
        quality: f32,
    ) -> Result<Vec<u8>, FileError> {
        let mut buf = Vec::new();
        match format {
            RasterFormat::Png => {
                image.write_with_encoder(PngEncoder::new(&mut buf))?;
            }
            RasterFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(
                    &mut buf,
                    jpeg_quality(quality),
                ))?;
            }
            RasterFormat::Webp => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
            }
        }
        Ok(buf)
    }

    fn resize_exact(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Triangle)
    }
}
