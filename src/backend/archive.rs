//! In-memory ZIP archives.

use super::{ArchiveFactory, ArchiveWriter};
use crate::error::FileError;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds deflate-compressed ZIP archives in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveFactory;

impl ArchiveFactory for ZipArchiveFactory {
    fn create(&self) -> Box<dyn ArchiveWriter> {
        Box::new(ZipArchiveWriter {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        })
    }
}

pub struct ZipArchiveWriter {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), FileError> {
        self.writer.start_file(name, self.options)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, FileError> {
        let cursor = self.writer.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn entries_round_trip_in_order() {
        let mut archive = ZipArchiveFactory.create();
        archive.add_entry("page-01.png", b"one").unwrap();
        archive.add_entry("page-02.png", b"two").unwrap();
        let bytes = archive.finish().unwrap();

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        let names: Vec<_> = zip.file_names().map(str::to_string).collect();
        assert!(names.contains(&"page-01.png".to_string()));

        let mut content = String::new();
        zip.by_name("page-02.png")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "two");
    }

    #[test]
    fn empty_archive_is_valid() {
        let bytes = ZipArchiveFactory.create().finish().unwrap();
        let zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 0);
    }
}
