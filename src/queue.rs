//! The in-memory file queue.
//!
//! [`FileQueue`] exclusively owns its [`QueuedFile`]s in insertion order.
//! Conversion routines only ever borrow a file and read its content; they
//! never mutate the queue. Order matters for display and for the order of
//! outcomes in a [`crate::output::BatchReport`], not for the conversions
//! themselves.

use crate::error::{ConvertError, FileError};
use crate::format::{classify, FormatCategory, TargetFormat};
use crate::resolve::available_targets;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Where a queued file's bytes live.
#[derive(Debug, Clone)]
pub enum FileContent {
    /// Read lazily from disk when a routine needs it.
    Path(PathBuf),
    /// Already in memory (tests, embedding applications).
    Memory(Arc<[u8]>),
}

/// One user-supplied file awaiting conversion.
#[derive(Debug, Clone)]
pub struct QueuedFile {
    /// Original file name including extension.
    pub display_name: String,
    /// Advisory content type; may be empty.
    pub media_type_hint: String,
    /// Size in bytes as reported when the file was added.
    pub byte_size: u64,
    pub content: FileContent,
}

impl QueuedFile {
    /// Queue in-memory bytes under `display_name`.
    pub fn from_bytes(
        display_name: impl Into<String>,
        media_type_hint: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        Self {
            display_name: display_name.into(),
            media_type_hint: media_type_hint.into(),
            byte_size: bytes.len() as u64,
            content: FileContent::Memory(bytes),
        }
    }

    /// Queue a local file, validating it exists and is readable.
    ///
    /// The media-type hint is guessed from the extension; override it with
    /// [`QueuedFile::with_media_type`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref().to_path_buf();

        let metadata = match std::fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(ConvertError::FileNotFound { path }),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(ConvertError::PermissionDenied { path });
            }
            Err(_) => return Err(ConvertError::FileNotFound { path }),
        };

        // Check read permission by attempting to open
        if let Err(e) = std::fs::File::open(&path) {
            return Err(if e.kind() == std::io::ErrorKind::PermissionDenied {
                ConvertError::PermissionDenied { path }
            } else {
                ConvertError::FileNotFound { path }
            });
        }

        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type_hint = mime_guess::from_path(&path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        debug!(
            "Queued local file: {} ({}, {} bytes)",
            path.display(),
            if media_type_hint.is_empty() { "no MIME" } else { &media_type_hint },
            metadata.len()
        );

        Ok(Self {
            display_name,
            media_type_hint,
            byte_size: metadata.len(),
            content: FileContent::Path(path),
        })
    }

    /// Replace the advisory media type.
    pub fn with_media_type(mut self, hint: impl Into<String>) -> Self {
        self.media_type_hint = hint.into();
        self
    }

    /// The file's semantic category.
    pub fn category(&self) -> FormatCategory {
        classify(&self.display_name, &self.media_type_hint)
    }

    /// Read the full content.
    pub async fn read(&self) -> Result<Arc<[u8]>, FileError> {
        match &self.content {
            FileContent::Memory(bytes) => Ok(Arc::clone(bytes)),
            FileContent::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| FileError::io(format!("reading '{}': {e}", path.display())))?;
                Ok(bytes.into())
            }
        }
    }
}

/// Stable identity of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(u64);

/// Insertion-ordered queue of files awaiting conversion.
#[derive(Debug, Default)]
pub struct FileQueue {
    entries: Vec<(FileId, QueuedFile)>,
    next_id: u64,
}

impl FileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file and return its id.
    pub fn push(&mut self, file: QueuedFile) -> FileId {
        let id = FileId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, file));
        id
    }

    pub fn extend<I: IntoIterator<Item = QueuedFile>>(&mut self, files: I) -> Vec<FileId> {
        files.into_iter().map(|f| self.push(f)).collect()
    }

    /// Remove a file, returning it if it was queued.
    pub fn remove(&mut self, id: FileId) -> Option<QueuedFile> {
        let pos = self.entries.iter().position(|(i, _)| *i == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: FileId) -> Option<&QueuedFile> {
        self.entries.iter().find(|(i, _)| *i == id).map(|(_, f)| f)
    }

    /// Files in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedFile> {
        self.entries.iter().map(|(_, f)| f)
    }

    /// Snapshot of the queued files in order.
    pub fn files(&self) -> Vec<QueuedFile> {
        self.iter().cloned().collect()
    }

    /// Distinct categories currently queued.
    pub fn categories_present(&self) -> BTreeSet<FormatCategory> {
        self.iter().map(QueuedFile::category).collect()
    }

    /// Targets worth offering for the current queue contents.
    pub fn available_targets(&self) -> Vec<TargetFormat> {
        available_targets(self.categories_present())
    }
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use std::io::Write;

    #[test]
    fn queue_preserves_insertion_order_and_identity() {
        let mut q = FileQueue::new();
        let a = q.push(QueuedFile::from_bytes("a.png", "", vec![1u8]));
        let b = q.push(QueuedFile::from_bytes("b.txt", "", vec![2u8]));
        let c = q.push(QueuedFile::from_bytes("a.png", "", vec![1u8]));
        assert_ne!(a, c);

        let names: Vec<_> = q.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.txt", "a.png"]);

        assert_eq!(q.remove(b).map(|f| f.display_name), Some("b.txt".to_string()));
        assert!(q.remove(b).is_none());
        assert_eq!(q.len(), 2);
        assert!(q.get(c).is_some());
    }

    #[test]
    fn categories_and_targets_follow_contents() {
        let mut q = FileQueue::new();
        assert_eq!(q.available_targets(), vec![TargetFormat::Auto]);

        let pdf = q.push(QueuedFile::from_bytes("doc.pdf", "", Vec::<u8>::new()));
        q.push(QueuedFile::from_bytes("notes.md", "", Vec::<u8>::new()));
        assert_eq!(
            q.categories_present().into_iter().collect::<Vec<_>>(),
            vec![FormatCategory::PortableDocument, FormatCategory::Markdown]
        );
        assert!(q.available_targets().contains(&OutputFormat::ZipOfJpeg.into()));

        q.remove(pdf);
        assert_eq!(
            q.available_targets(),
            vec![TargetFormat::Auto, OutputFormat::Pdf.into()]
        );
    }

    #[test]
    fn from_path_guesses_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"# Title")
            .unwrap();

        let file = QueuedFile::from_path(&path).unwrap();
        assert_eq!(file.display_name, "notes.md");
        assert_eq!(file.byte_size, 7);
        assert_eq!(file.media_type_hint, "text/markdown");
        assert_eq!(file.category(), FormatCategory::Markdown);
    }

    #[test]
    fn from_path_missing_file() {
        let err = QueuedFile::from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[test]
    fn read_from_disk_and_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();

        let on_disk = QueuedFile::from_path(&path).unwrap();
        let in_memory = QueuedFile::from_bytes("a.txt", "text/plain", b"hello".to_vec());

        let disk_bytes = tokio_test::block_on(on_disk.read()).unwrap();
        let mem_bytes = tokio_test::block_on(in_memory.read()).unwrap();
        assert_eq!(&*disk_bytes, b"hello");
        assert_eq!(disk_bytes, mem_bytes);
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0.0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
