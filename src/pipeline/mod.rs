//! Conversion routines, one per kind of (category, output) pair.
//!
//! Each routine is a plain blocking function over a [`Backends`] value and
//! the input bytes, returning one [`Artifact`]. The dispatcher runs them in
//! `spawn_blocking` and hands the artifact to the download sink; routines
//! never save anything themselves.
//!
//! ```text
//! Image ─┬─▶ raster    ──▶ .png / .jpg / .webp / .ico
//!        └─▶ compose   ──▶ .pdf            (one fitted page)
//! PDF   ───▶ rasterize ──▶ -png.zip / -jpg.zip (one entry per page)
//! DOCX  ─┐
//! TXT   ─┼─▶ document  ──▶ .pdf            (printable HTML → layout)
//! MD    ─┘
//! ```
//!
//! [`Backends`]: crate::backend::Backends

pub mod compose;
pub mod document;
pub mod raster;
pub mod rasterize;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A finished output, not yet saved.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Set by the dispatcher when a routine overruns its time limit. Routines
/// with natural checkpoints (one per PDF page) stop at the next one.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
