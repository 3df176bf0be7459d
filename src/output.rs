//! Output types: per-file outcomes and the batch report.

use crate::error::FileError;
use crate::format::{FormatCategory, OutputFormat};
use serde::Serialize;
use std::path::PathBuf;

/// Result of converting one queued file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// The artifact was produced and saved.
    Success {
        /// Name the artifact was saved under (before any de-duplication by
        /// the sink).
        file_name: String,
        /// Where the sink put it.
        saved_to: PathBuf,
        /// Artifact size in bytes.
        byte_len: usize,
        output_format: OutputFormat,
    },
    /// The file was skipped; the batch went on.
    Failure {
        /// Human-readable reason (the error's `Display` text).
        reason: String,
        error: FileError,
    },
}

impl ConversionOutcome {
    pub(crate) fn failure(error: FileError) -> Self {
        Self::Failure {
            reason: error.to_string(),
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Output file name on success.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Success { file_name, .. } => Some(file_name),
            Self::Failure { .. } => None,
        }
    }

    /// Failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(reason),
        }
    }
}

/// An outcome tagged with the input it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    /// 1-indexed position in the batch.
    pub index: usize,
    pub input_name: String,
    pub category: FormatCategory,
    #[serde(flatten)]
    pub outcome: ConversionOutcome,
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Wall-clock duration of the whole batch.
    pub duration_ms: u64,
}

/// Every file's outcome, in queue order, plus totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub(crate) fn new(files: Vec<FileOutcome>, duration_ms: u64) -> Self {
        let succeeded = files.iter().filter(|f| f.outcome.is_success()).count();
        let stats = BatchStats {
            total_files: files.len(),
            succeeded,
            failed: files.len() - succeeded,
            duration_ms,
        };
        Self { files, stats }
    }

    /// The bare outcomes, in queue order.
    pub fn outcomes(&self) -> impl Iterator<Item = &ConversionOutcome> {
        self.files.iter().map(|f| &f.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.outcome.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.stats.failed == 0
    }
}
