//! The conversion dispatcher.
//!
//! [`Converter`] ties the pieces together: for each queued file it
//! classifies, resolves the target, runs the matching routine from
//! [`crate::pipeline`], and hands the artifact to the download sink.
//!
//! ## Why one file at a time?
//!
//! Routines are CPU-bound and pdfium is not re-entrant. Files are converted
//! strictly in queue order, each routine running in `spawn_blocking` and
//! awaited before the next file starts. That keeps memory bounded to one
//! file's working set and makes progress reporting trivially ordered.
//!
//! A blocking task cannot be aborted, so a file that exceeds its time limit
//! is flagged as cancelled and then drained: the dispatcher waits for the
//! routine to return before moving on, and the file is reported as timed
//! out whatever the routine produced.
//!
//! ## Failure isolation
//!
//! A file that fails (unsupported target, corrupt input, engine error,
//! timeout) becomes a [`ConversionOutcome::Failure`]; the batch always
//! continues. Only an empty batch is rejected up front.

use crate::backend::{Backends, RasterFormat};
use crate::config::ConversionConfig;
use crate::error::{ConvertError, FileError};
use crate::format::{FormatCategory, OutputFormat, TargetFormat};
use crate::output::{BatchReport, ConversionOutcome, FileOutcome};
use crate::pipeline::{compose, document, raster, rasterize, Artifact, CancelFlag};
use crate::progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
use crate::queue::{FileQueue, QueuedFile};
use crate::resolve::resolve;
use crate::sink::{DirectorySink, DownloadSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Converts queued files and saves the results.
///
/// Cheap to clone; clones share backends, sink and progress callback.
///
/// # Example
/// ```rust,no_run
/// use edgequake_fileconv::{ConversionConfig, Converter, QueuedFile, TargetFormat};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = Converter::to_directory(ConversionConfig::default(), "out")?;
/// let files = vec![QueuedFile::from_path("photo.png")?];
/// let report = converter.convert_batch(&files, "jpg".parse()?).await?;
/// println!("{}/{} converted", report.stats.succeeded, report.stats.total_files);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Converter {
    config: ConversionConfig,
    backends: Backends,
    sink: Arc<dyn DownloadSink>,
}

impl Converter {
    /// `config` is [normalised](ConversionConfig::normalized) first.
    pub fn new(config: ConversionConfig, backends: Backends, sink: Arc<dyn DownloadSink>) -> Self {
        Self {
            config: config.normalized(),
            backends,
            sink,
        }
    }

    /// Default backends, saving into `dir` (created if missing).
    pub fn to_directory(
        config: ConversionConfig,
        dir: impl Into<PathBuf>,
    ) -> Result<Self, ConvertError> {
        let sink = DirectorySink::new(dir)?;
        Ok(Self::new(config, Backends::default(), Arc::new(sink)))
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn callback(&self) -> ProgressCallback {
        self.config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback))
    }

    /// Convert a single file. Never fails; problems become
    /// [`ConversionOutcome::Failure`].
    pub async fn convert_one(&self, file: &QueuedFile, target: TargetFormat) -> ConversionOutcome {
        match self.try_convert(file, target).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("{}: {}", file.display_name, error);
                ConversionOutcome::failure(error)
            }
        }
    }

    /// Convert every file in order, continuing past failures.
    ///
    /// # Errors
    /// [`ConvertError::EmptyQueue`] if `files` is empty. Per-file problems
    /// never surface here.
    pub async fn convert_batch(
        &self,
        files: &[QueuedFile],
        target: TargetFormat,
    ) -> Result<BatchReport, ConvertError> {
        if files.is_empty() {
            return Err(ConvertError::EmptyQueue);
        }

        let start = Instant::now();
        let total = files.len();
        let callback = self.callback();
        info!("Starting batch: {} files → {}", total, target);
        callback.on_batch_start(total);

        let mut outcomes = Vec::with_capacity(total);
        for (i, file) in files.iter().enumerate() {
            let outcome = self.convert_indexed(i + 1, total, file, target).await;
            callback.on_progress(i + 1, total);
            outcomes.push(outcome);
        }

        let report = BatchReport::new(outcomes, start.elapsed().as_millis() as u64);
        info!(
            "Batch complete: {}/{} succeeded, {}ms",
            report.stats.succeeded, report.stats.total_files, report.stats.duration_ms
        );
        callback.on_batch_complete(total, report.stats.succeeded);
        Ok(report)
    }

    /// [`Self::convert_batch`] over the queue's files in insertion order.
    pub async fn convert_queue(
        &self,
        queue: &FileQueue,
        target: TargetFormat,
    ) -> Result<BatchReport, ConvertError> {
        self.convert_batch(&queue.files(), target).await
    }

    /// Synchronous wrapper around [`Self::convert_batch`].
    ///
    /// Creates a temporary tokio runtime internally.
    pub fn convert_batch_sync(
        &self,
        files: &[QueuedFile],
        target: TargetFormat,
    ) -> Result<BatchReport, ConvertError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert_batch(files, target))
    }

    /// One file with per-file progress events, tagged for the report.
    pub(crate) async fn convert_indexed(
        &self,
        index: usize,
        total: usize,
        file: &QueuedFile,
        target: TargetFormat,
    ) -> FileOutcome {
        let callback = self.callback();
        callback.on_file_start(index, total, &file.display_name);

        let outcome = self.convert_one(file, target).await;
        match &outcome {
            ConversionOutcome::Success { file_name, .. } => {
                callback.on_file_complete(index, total, file_name)
            }
            ConversionOutcome::Failure { reason, .. } => callback.on_file_error(index, total, reason),
        }

        FileOutcome {
            index,
            input_name: file.display_name.clone(),
            category: file.category(),
            outcome,
        }
    }

    async fn try_convert(
        &self,
        file: &QueuedFile,
        target: TargetFormat,
    ) -> Result<ConversionOutcome, FileError> {
        // ── Step 1: Classify and resolve ─────────────────────────────────
        let category = file.category();
        let format = resolve(category, target)?;
        info!(
            "Converting {} ({}) → {}",
            file.display_name, category, format
        );

        // ── Step 2: Run the routine, optionally bounded ──────────────────
        let artifact = self.run_routine(file, category, format).await?;

        // ── Step 3: Save exactly once ────────────────────────────────────
        let byte_len = artifact.bytes.len();
        let saved_to = self.sink.save(&artifact.file_name, artifact.bytes).await?;
        debug!("Saved {} → {}", artifact.file_name, saved_to.display());

        Ok(ConversionOutcome::Success {
            file_name: artifact.file_name,
            saved_to,
            byte_len,
            output_format: format,
        })
    }

    async fn run_routine(
        &self,
        file: &QueuedFile,
        category: FormatCategory,
        format: OutputFormat,
    ) -> Result<Artifact, FileError> {
        let bytes = file.read().await?;
        let name = file.display_name.clone();
        let backends = self.backends.clone();
        let quality = self.config.image_quality;
        let page_size = self.config.page_size;
        let ico_size = self.config.ico_size;
        let callback = self.callback();
        let cancel = CancelFlag::default();
        let cancel_routine = cancel.clone();

        let routine = move || match (category, format) {
            (FormatCategory::Image, OutputFormat::Ico) => {
                raster::image_to_ico(&backends, &name, &bytes, ico_size)
            }
            (FormatCategory::Image, OutputFormat::Pdf) => {
                compose::image_to_pdf(&backends, &name, &bytes, page_size, quality)
            }
            (FormatCategory::Image, other) => match raster::raster_format(other) {
                Some(raster_format) => {
                    raster::image_to_image(&backends, &name, &bytes, raster_format, quality)
                }
                None => Err(unsupported(category, other)),
            },
            (FormatCategory::PortableDocument, OutputFormat::ZipOfPng) => {
                rasterize::pdf_to_archive(
                    &backends,
                    &name,
                    &bytes,
                    RasterFormat::Png,
                    callback.as_ref(),
                    &cancel_routine,
                )
            }
            (FormatCategory::PortableDocument, OutputFormat::ZipOfJpeg) => {
                rasterize::pdf_to_archive(
                    &backends,
                    &name,
                    &bytes,
                    RasterFormat::Jpeg,
                    callback.as_ref(),
                    &cancel_routine,
                )
            }
            (FormatCategory::RichDocument, OutputFormat::Pdf) => {
                document::docx_to_pdf(&backends, &name, &bytes, page_size)
            }
            (FormatCategory::PlainText, OutputFormat::Pdf) => {
                document::text_to_pdf(&backends, &name, &bytes, page_size, false)
            }
            (FormatCategory::Markdown, OutputFormat::Pdf) => {
                document::text_to_pdf(&backends, &name, &bytes, page_size, true)
            }
            (category, other) => Err(unsupported(category, other)),
        };

        blocking(routine, self.config.file_timeout_secs, cancel).await
    }
}

fn unsupported(category: FormatCategory, format: OutputFormat) -> FileError {
    FileError::UnsupportedCombination {
        category,
        requested: format.into(),
    }
}

/// Run a routine on the blocking pool, bounded by `limit` seconds.
///
/// On timeout the routine is cancelled and awaited to completion, so it never
/// overlaps the next file's routine.
async fn blocking<F>(
    routine: F,
    limit: Option<u64>,
    cancel: CancelFlag,
) -> Result<Artifact, FileError>
where
    F: FnOnce() -> Result<Artifact, FileError> + Send + 'static,
{
    let mut task = tokio::task::spawn_blocking(routine);
    let Some(secs) = limit else {
        return joined(task.await);
    };

    match tokio::time::timeout(Duration::from_secs(secs), &mut task).await {
        Ok(result) => joined(result),
        Err(_) => {
            cancel.cancel();
            warn!("Routine exceeded {}s, waiting for it to stop", secs);
            if let Err(e) = joined(task.await) {
                debug!("Cancelled routine ended with: {}", e);
            }
            Err(FileError::Timeout { secs })
        }
    }
}

fn joined(
    result: Result<Result<Artifact, FileError>, tokio::task::JoinError>,
) -> Result<Artifact, FileError> {
    result.map_err(|e| FileError::render(format!("conversion task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn converter(sink: Arc<MemorySink>) -> Converter {
        Converter::new(ConversionConfig::default(), Backends::default(), sink)
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let c = converter(Arc::new(MemorySink::new()));
        let err = c.convert_batch(&[], TargetFormat::Auto).await.unwrap_err();
        assert!(matches!(err, ConvertError::EmptyQueue));
    }

    #[tokio::test]
    async fn unsupported_file_saves_nothing() {
        let sink = Arc::new(MemorySink::new());
        let c = converter(sink.clone());
        let file = QueuedFile::from_bytes("notes.txt", "", b"hello".to_vec());
        let outcome = c.convert_one(&file, OutputFormat::Ico.into()).await;
        assert!(matches!(
            outcome,
            ConversionOutcome::Failure {
                error: FileError::UnsupportedCombination { .. },
                ..
            }
        ));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn unrecognized_auto_fails_with_reason() {
        let c = converter(Arc::new(MemorySink::new()));
        let file = QueuedFile::from_bytes("data.bin", "", vec![0u8; 4]);
        let outcome = c.convert_one(&file, TargetFormat::Auto).await;
        assert!(outcome.reason().unwrap().contains("no automatic target"));
    }

    #[test]
    fn sync_wrapper_runs_batch() {
        let c = converter(Arc::new(MemorySink::new()));
        let files = vec![QueuedFile::from_bytes("x.bin", "", vec![1u8])];
        let report = c.convert_batch_sync(&files, TargetFormat::Auto).unwrap();
        assert_eq!(report.stats.failed, 1);
    }
}
