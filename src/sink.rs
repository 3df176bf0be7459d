//! Where finished artifacts go.
//!
//! Every successful conversion hands its bytes to a [`DownloadSink`] exactly
//! once. [`DirectorySink`] writes to disk; [`MemorySink`] keeps artifacts in
//! memory for tests and embedding applications.

use crate::error::{ConvertError, FileError};
use futures::future::{BoxFuture, FutureExt};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Highest ` (N)` suffix tried before giving up on a free name.
const MAX_DUPLICATES: u32 = 999;

/// Receives each finished artifact.
pub trait DownloadSink: Send + Sync {
    /// Persist `bytes` under `file_name`, returning where they ended up.
    fn save<'a>(&'a self, file_name: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, Result<PathBuf, FileError>>;
}

// ── Directory ────────────────────────────────────────────────────────────

/// Writes artifacts into a directory.
///
/// Writes are atomic (temp file + rename) and never overwrite: if
/// `photo.png` exists the artifact is saved as `photo (1).png`, the way a
/// browser names repeated downloads. This also protects input files that
/// live in the output directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ConvertError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| ConvertError::OutputDirUnavailable {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save<'a>(&'a self, file_name: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, Result<PathBuf, FileError>> {
        let dir = self.dir.clone();
        let name = file_name.to_string();
        async move {
            tokio::task::spawn_blocking(move || write_atomic(&dir, &name, &bytes))
                .await
                .map_err(|e| FileError::io(format!("save task panicked: {e}")))?
        }
        .boxed()
    }
}

fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, FileError> {
    // Names come from display names; never let one escape the directory.
    let file_name = Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| FileError::io(format!("invalid output name '{file_name}'")))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".fileconv-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| FileError::io(format!("creating temp file in '{}': {e}", dir.display())))?;
    tmp.write_all(bytes)
        .map_err(|e| FileError::io(format!("writing '{file_name}': {e}")))?;

    let mut candidate = dir.join(&file_name);
    for n in 1..=MAX_DUPLICATES + 1 {
        match tmp.persist_noclobber(&candidate) {
            Ok(_) => {
                debug!("Saved {} ({} bytes)", candidate.display(), bytes.len());
                return Ok(candidate);
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists && n <= MAX_DUPLICATES => {
                tmp = e.file;
                candidate = dir.join(numbered_name(&file_name, n));
            }
            Err(e) => {
                return Err(FileError::io(format!(
                    "saving '{}': {}",
                    candidate.display(),
                    e.error
                )));
            }
        }
    }
    Err(FileError::io(format!("no free name for '{file_name}'")))
}

/// `photo.png` → `photo (n).png`.
pub fn numbered_name(file_name: &str, n: u32) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &file_name[..dot], &file_name[dot..]),
        _ => format!("{file_name} ({n})"),
    }
}

// ── Memory ───────────────────────────────────────────────────────────────

/// One artifact captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Collects artifacts in memory, in save order.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<SavedArtifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far.
    pub fn saved(&self) -> Vec<SavedArtifact> {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DownloadSink for MemorySink {
    fn save<'a>(&'a self, file_name: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, Result<PathBuf, FileError>> {
        async move {
            self.saved
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(SavedArtifact {
                    file_name: file_name.to_string(),
                    bytes,
                });
            Ok(PathBuf::from(file_name))
        }
        .boxed()
    }
}
