//! Streaming conversion API: emit outcomes as files complete.
//!
//! ## Why stream?
//!
//! A batch of large PDFs can take minutes. [`convert_stream`] yields each
//! [`FileOutcome`] as soon as its file is done, so callers can update a UI,
//! log, or react to failures without waiting for the whole
//! [`crate::output::BatchReport`].
//!
//! Files are still processed one at a time, so outcomes arrive in queue
//! order. The same isolation rules as [`Converter::convert_batch`] apply: a
//! failing file yields a `Failure` outcome and the stream continues.

use crate::dispatch::Converter;
use crate::error::ConvertError;
use crate::format::TargetFormat;
use crate::output::FileOutcome;
use crate::progress::ConversionProgressCallback;
use crate::queue::QueuedFile;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-file outcomes.
pub type OutcomeStream<'a> = Pin<Box<dyn Stream<Item = FileOutcome> + Send + 'a>>;

/// Convert `files` in order, yielding each outcome when it is ready.
///
/// Progress callbacks fire exactly as in [`Converter::convert_batch`],
/// except `on_batch_complete`, which has no natural point in a lazily
/// consumed stream.
///
/// # Errors
/// [`ConvertError::EmptyQueue`] if `files` is empty.
pub fn convert_stream<'a>(
    converter: &'a Converter,
    files: &'a [QueuedFile],
    target: TargetFormat,
) -> Result<OutcomeStream<'a>, ConvertError> {
    if files.is_empty() {
        return Err(ConvertError::EmptyQueue);
    }

    let total = files.len();
    info!("Starting streaming batch: {} files → {}", total, target);
    if let Some(ref cb) = converter.config().progress_callback {
        cb.on_batch_start(total);
    }

    let s = stream::iter(files.iter().enumerate()).then(move |(i, file)| async move {
        let outcome = converter.convert_indexed(i + 1, total, file, target).await;
        if let Some(ref cb) = converter.config().progress_callback {
            cb.on_progress(i + 1, total);
        }
        outcome
    });

    Ok(Box::pin(s))
}
