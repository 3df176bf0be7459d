//! Error types for the edgequake-fileconv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] is **fatal**: the batch cannot start at all (empty
//!   queue, invalid configuration, PDF engine unavailable). Returned as
//!   `Err(ConvertError)` from the top-level entry points.
//!
//! * [`FileError`] is **non-fatal**: a single file failed (unsupported target,
//!   corrupt image, broken PDF) but every other file in the batch is still
//!   attempted. Stored inside [`crate::output::ConversionOutcome::Failure`].

use crate::format::{FormatCategory, TargetFormat};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-fileconv library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The batch was started with nothing queued.
    #[error("No files queued\nAdd at least one file before converting.")]
    EmptyQueue,

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output directory could not be created.
    #[error("Output directory '{path}' is unavailable: {source}")]
    OutputDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF conversions need libpdfium at runtime. You can:\n\
  • Install it system-wide (e.g. into /usr/local/lib).\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir/containing/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single queued file.
///
/// The `Display` text is what ends up in
/// [`crate::output::ConversionOutcome::Failure::reason`].
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The category/target pair is not in the resolver's table.
    #[error("Unsupported combination: {category} cannot be converted to {requested}")]
    UnsupportedCombination {
        category: FormatCategory,
        requested: TargetFormat,
    },

    /// `auto` was requested for a file with no default output.
    #[error("Unsupported format: no automatic target for {category} files")]
    NoAutoTarget { category: FormatCategory },

    /// The raster codec rejected the input bytes.
    #[error("Decode failed: {detail}")]
    DecodeFailure { detail: String },

    /// A rendering/authoring capability failed (malformed PDF, corrupt DOCX…).
    #[error("Render failed: {detail}")]
    RenderFailure { detail: String },

    /// Reading the input or saving the output failed.
    #[error("I/O failed: {detail}")]
    IoFailure { detail: String },

    /// The per-file timeout elapsed.
    #[error("Conversion timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl FileError {
    pub fn decode(detail: impl std::fmt::Display) -> Self {
        Self::DecodeFailure {
            detail: detail.to_string(),
        }
    }

    pub fn render(detail: impl std::fmt::Display) -> Self {
        Self::RenderFailure {
            detail: detail.to_string(),
        }
    }

    pub fn io(detail: impl std::fmt::Display) -> Self {
        Self::IoFailure {
            detail: detail.to_string(),
        }
    }
}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e)
    }
}

impl From<image::ImageError> for FileError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => Self::io(io),
            image::ImageError::Encoding(_) | image::ImageError::Parameter(_) => Self::render(e),
            other => Self::decode(other),
        }
    }
}

impl From<zip::result::ZipError> for FileError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::render(format!("archive: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;

    #[test]
    fn empty_queue_display() {
        assert!(ConvertError::EmptyQueue.to_string().contains("No files"));
    }

    #[test]
    fn unsupported_combination_names_both_sides() {
        let e = FileError::UnsupportedCombination {
            category: FormatCategory::RichDocument,
            requested: TargetFormat::Explicit(OutputFormat::Ico),
        };
        let msg = e.to_string();
        assert!(msg.contains("DOCX"), "got: {msg}");
        assert!(msg.contains("ICO"), "got: {msg}");
    }

    #[test]
    fn no_auto_target_display() {
        let e = FileError::NoAutoTarget {
            category: FormatCategory::Unrecognized,
        };
        assert!(e.to_string().contains("no automatic target"));
    }

    #[test]
    fn timeout_display() {
        assert!(FileError::Timeout { secs: 30 }.to_string().contains("30s"));
    }

    #[test]
    fn io_error_converts() {
        let e: FileError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, FileError::IoFailure { .. }));
    }
}
