//! Configuration types for file conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config replaces the ad-hoc
//! session state a UI would keep (quality slider, page-size dropdown) with a
//! value that is passed explicitly to the dispatcher.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Default raster encode quality for image → image conversions.
pub const DEFAULT_IMAGE_QUALITY: f32 = 0.92;

/// Default square edge of generated icons, in pixels.
pub const DEFAULT_ICO_SIZE: u32 = 32;

/// Accepted icon edge range, in pixels.
pub const MIN_ICO_SIZE: u32 = 16;
pub const MAX_ICO_SIZE: u32 = 256;

/// Configuration for a conversion batch.
///
/// # Example
/// ```rust
/// use edgequake_fileconv::{ConversionConfig, PageSize};
///
/// let config = ConversionConfig::builder()
///     .image_quality(0.8)
///     .page_size(PageSize::Letter)
///     .build()
///     .unwrap();
/// assert_eq!(config.ico_size, 32);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Encode quality for PNG/JPEG/WEBP outputs, in `(0, 1]`. Default: 0.92.
    ///
    /// Only lossy encoders honour it; PNG and the lossless WEBP encoder
    /// ignore the value.
    pub image_quality: f32,

    /// Page geometry for PDF outputs. Default: [`PageSize::A4`].
    ///
    /// [`PageSize::Auto`] sizes image pages to the image's aspect ratio; the
    /// document renderers treat it as A4.
    pub page_size: PageSize,

    /// Square icon size in pixels, 16–256. Default: 32.
    pub ico_size: u32,

    /// Optional per-file time limit in seconds. Default: None (no limit).
    pub file_timeout_secs: Option<u64>,

    /// Optional progress event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            image_quality: DEFAULT_IMAGE_QUALITY,
            page_size: PageSize::default(),
            ico_size: DEFAULT_ICO_SIZE,
            file_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("image_quality", &self.image_quality)
            .field("page_size", &self.page_size)
            .field("ico_size", &self.ico_size)
            .field("file_timeout_secs", &self.file_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Pull out-of-range values back to what the builder accepts. Fields are
    /// public, so a config written as a struct literal can skip the builder;
    /// the dispatcher normalises every config it is given.
    ///
    /// Quality above 1 becomes 1; zero, negative or NaN quality falls back to
    /// [`DEFAULT_IMAGE_QUALITY`].
    pub fn normalized(mut self) -> Self {
        let ico_size = self.ico_size.clamp(MIN_ICO_SIZE, MAX_ICO_SIZE);
        if ico_size != self.ico_size {
            warn!("ico_size {} out of range, using {}", self.ico_size, ico_size);
            self.ico_size = ico_size;
        }

        if self.image_quality > 1.0 {
            self.image_quality = 1.0;
        } else if self.image_quality.is_nan() || self.image_quality <= 0.0 {
            warn!(
                "image_quality {} out of range, using {}",
                self.image_quality, DEFAULT_IMAGE_QUALITY
            );
            self.image_quality = DEFAULT_IMAGE_QUALITY;
        }

        self.file_timeout_secs = self.file_timeout_secs.map(|secs| secs.max(1));
        self
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn image_quality(mut self, q: f32) -> Self {
        self.config.image_quality = q;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn ico_size(mut self, px: u32) -> Self {
        self.config.ico_size = px.clamp(MIN_ICO_SIZE, MAX_ICO_SIZE);
        self
    }

    pub fn file_timeout_secs(mut self, secs: u64) -> Self {
        self.config.file_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !(c.image_quality > 0.0 && c.image_quality <= 1.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "Image quality must be in (0, 1], got {}",
                c.image_quality
            )));
        }
        Ok(self.config)
    }
}

const A4_POINTS: (f32, f32) = (595.28, 841.89);

// ── Enums ────────────────────────────────────────────────────────────────

/// Page geometry used for PDF outputs, in PDF points (1/72 in).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    /// Image pages follow the image's aspect ratio at a fixed 595 pt width.
    Auto,
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    /// Width of an `Auto` image page.
    pub const AUTO_WIDTH: f32 = 595.0;

    /// Fixed `(width, height)` in portrait orientation, or `None` for `Auto`.
    pub fn dimensions(self) -> Option<(f32, f32)> {
        match self {
            PageSize::Auto => None,
            PageSize::A3 => Some((841.89, 1190.55)),
            PageSize::A4 => Some(A4_POINTS),
            PageSize::A5 => Some((419.53, 595.28)),
            PageSize::Letter => Some((612.0, 792.0)),
            PageSize::Legal => Some((612.0, 1008.0)),
        }
    }

    /// Geometry for flowing documents, where `Auto` has no image to follow.
    pub fn document_dimensions(self) -> (f32, f32) {
        self.dimensions().unwrap_or(A4_POINTS)
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(PageSize::Auto),
            "a3" => Ok(PageSize::A3),
            "a4" | "" => Ok(PageSize::A4),
            "a5" => Ok(PageSize::A5),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            other => Err(format!("unknown page size '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.image_quality, 0.92);
        assert_eq!(c.page_size, PageSize::A4);
        assert_eq!(c.ico_size, 32);
        assert!(c.file_timeout_secs.is_none());
    }

    #[test]
    fn quality_out_of_range_rejected() {
        assert!(ConversionConfig::builder().image_quality(0.0).build().is_err());
        assert!(ConversionConfig::builder().image_quality(1.5).build().is_err());
        assert!(ConversionConfig::builder().image_quality(f32::NAN).build().is_err());
        assert!(ConversionConfig::builder().image_quality(1.0).build().is_ok());
    }

    #[test]
    fn ico_size_clamped() {
        let c = ConversionConfig::builder().ico_size(1024).build().unwrap();
        assert_eq!(c.ico_size, 256);
        let c = ConversionConfig::builder().ico_size(1).build().unwrap();
        assert_eq!(c.ico_size, 16);
    }

    #[test]
    fn page_size_parse_and_geometry() {
        assert_eq!("Letter".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert_eq!("auto".parse::<PageSize>().unwrap(), PageSize::Auto);
        assert!("b5".parse::<PageSize>().is_err());
        assert_eq!(PageSize::Auto.dimensions(), None);
        assert_eq!(PageSize::Auto.document_dimensions(), (595.28, 841.89));
    }

    #[test]
    fn literal_configs_are_normalized() {
        let c = ConversionConfig {
            ico_size: 0,
            image_quality: f32::NAN,
            file_timeout_secs: Some(0),
            ..ConversionConfig::default()
        }
        .normalized();
        assert_eq!(c.ico_size, 16);
        assert_eq!(c.image_quality, DEFAULT_IMAGE_QUALITY);
        assert_eq!(c.file_timeout_secs, Some(1));

        let c = ConversionConfig {
            ico_size: 4096,
            image_quality: 3.0,
            ..ConversionConfig::default()
        }
        .normalized();
        assert_eq!(c.ico_size, 256);
        assert_eq!(c.image_quality, 1.0);
    }
}
