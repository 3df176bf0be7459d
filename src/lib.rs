//! # edgequake-fileconv
//!
//! Convert images, PDFs, DOCX, plain text and Markdown files locally.
//!
//! ## Why this crate?
//!
//! Quick format conversions (a PNG to JPEG, a scanned PDF to page images, a
//! Markdown note to PDF) should not require uploading files to a web
//! service. Everything here runs in-process: the `image` crate for rasters,
//! pdfium for PDFs, and a small HTML layout engine for printable documents.
//!
//! ## Conversion Overview
//!
//! ```text
//! QueuedFile
//!  │
//!  ├─ 1. Classify  name + media type → FormatCategory (fixed precedence)
//!  ├─ 2. Resolve   category + requested target (or auto) → OutputFormat
//!  ├─ 3. Convert   matching routine in spawn_blocking, one file at a time
//!  └─ 4. Save      exactly one artifact per success via the DownloadSink
//! ```
//!
//! | Input | Targets | Auto |
//! |-------|---------|------|
//! | PNG / JPEG / WEBP | PNG, JPG, WEBP, ICO, PDF | PNG |
//! | PDF | ZIP of PNG pages, ZIP of JPG pages | ZIP (PNG) |
//! | DOCX | PDF | PDF |
//! | TXT | PDF | PDF |
//! | MD | PDF | PDF |
//!
//! A file that cannot be converted is reported and skipped; the rest of the
//! batch still runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_fileconv::{ConversionConfig, Converter, FileQueue, QueuedFile, TargetFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut queue = FileQueue::new();
//!     queue.push(QueuedFile::from_path("photo.webp")?);
//!     queue.push(QueuedFile::from_path("notes.md")?);
//!
//!     let converter = Converter::to_directory(ConversionConfig::default(), "out")?;
//!     let report = converter.convert_queue(&queue, TargetFormat::Auto).await?;
//!     for file in &report.files {
//!         println!("{}: {:?}", file.input_name, file.outcome.file_name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileconv` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-fileconv = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! PDF outputs and PDF inputs need libpdfium at runtime (set
//! `PDFIUM_LIB_PATH` to its directory if it is not on the system library
//! path). Image → image conversions work without it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod markup;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod resolve;
pub mod sink;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::Backends;
pub use config::{ConversionConfig, ConversionConfigBuilder, PageSize};
pub use dispatch::Converter;
pub use error::{ConvertError, FileError};
pub use format::{classify, replace_ext, FormatCategory, OutputFormat, TargetFormat};
pub use output::{BatchReport, BatchStats, ConversionOutcome, FileOutcome};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use queue::{FileId, FileQueue, QueuedFile};
pub use resolve::{available_targets, resolve, valid_targets};
pub use sink::{DirectorySink, DownloadSink, MemorySink};
pub use stream::convert_stream;
