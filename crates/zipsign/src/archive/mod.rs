//! ZIP archive access.
//!
//! Reading input entries one at a time ([`ArchiveReader`]) and writing the
//! signed output ([`ArchiveAssembler`]).

pub mod assemble;

pub use assemble::{ArchiveAssembler, CompressionLevel, MetadataEntry};

use crate::{Error, Result};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::{ZipArchive, ZipWriter};

/// A named entry and its uncompressed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path-like entry name, unique within the archive.
    pub name: String,
    /// Uncompressed bytes.
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

/// Read-only view of an input archive.
pub struct ArchiveReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl ArchiveReader {
    /// Open a ZIP archive for reading.
    ///
    /// The central directory is located from the end of the file, so
    /// archives with leading data (self-extracting stubs) are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened and
    /// [`Error::ArchiveRead`] if it has no readable central directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("Archive not found or unreadable: {}: {}", path.display(), e),
            ))
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| {
            Error::ArchiveRead(format!("Not a valid ZIP archive: {}: {}", path.display(), e))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Name of the entry at `index` without decompressing it.
    pub fn entry_name(&mut self, index: usize) -> Result<String> {
        let file = self
            .archive
            .by_index_raw(index)
            .map_err(|e| Error::ArchiveRead(format!("entry #{}: {}", index, e)))?;
        Ok(file.name().to_string())
    }

    /// Decompress the entry at `index`.
    ///
    /// The CRC is verified once the whole entry has been read, so corrupt
    /// data surfaces here as [`Error::ArchiveRead`].
    pub fn read_entry(&mut self, index: usize) -> Result<ArchiveEntry> {
        let mut file = self
            .archive
            .by_index(index)
            .map_err(|e| Error::ArchiveRead(format!("entry #{}: {}", index, e)))?;

        let name = file.name().to_string();
        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::ArchiveRead(format!("{}: {}", name, e)))?;

        Ok(ArchiveEntry { name, content })
    }

    /// Copy the entry at `index` into `writer` without recompressing it.
    ///
    /// Compressed bytes, CRC, timestamps and permissions are carried over as-is.
    pub fn raw_copy_into<W: Write + Seek>(
        &mut self,
        index: usize,
        writer: &mut ZipWriter<W>,
    ) -> Result<()> {
        let file = self
            .archive
            .by_index_raw(index)
            .map_err(|e| Error::ArchiveRead(format!("entry #{}: {}", index, e)))?;
        let name = file.name().to_string();

        writer
            .raw_copy_file(file)
            .map_err(|e| Error::ArchiveWrite(format!("copying {}: {}", name, e)))
    }
}

/// Validate that a path is a readable ZIP archive.
pub fn validate_archive(path: impl AsRef<Path>) -> Result<()> {
    ArchiveReader::open(path).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn create_test_zip(dir: &Path) -> PathBuf {
        let path = dir.join("test.zip");
        let file = File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        zip.start_file("module.prop", options).unwrap();
        zip.write_all(b"id=test\n").unwrap();
        zip.add_directory("system/", options).unwrap();
        zip.start_file("META-INF/com/google/android/updater-script", options)
            .unwrap();
        zip.write_all(b"#MAGISK\n").unwrap();

        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_validate_archive_valid() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_zip(temp_dir.path());
        assert!(validate_archive(&path).is_ok());
    }

    #[test]
    fn test_validate_archive_not_found() {
        assert!(matches!(
            validate_archive("/nonexistent/file.zip"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_validate_archive_invalid_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.zip");
        fs::write(&path, b"not a zip file").unwrap();
        assert!(matches!(validate_archive(&path), Err(Error::ArchiveRead(_))));
    }

    #[test]
    fn test_validate_archive_too_short() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("short.zip");
        fs::write(&path, b"PK").unwrap();
        assert!(matches!(validate_archive(&path), Err(Error::ArchiveRead(_))));
    }

    #[test]
    fn test_open_archive_with_leading_stub() {
        let temp_dir = TempDir::new().unwrap();
        let plain = create_test_zip(temp_dir.path());

        let mut data = b"#!/bin/sh\nexit 0\n".to_vec();
        data.extend(fs::read(&plain).unwrap());
        let path = temp_dir.path().join("sfx.zip");
        fs::write(&path, data).unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.len(), 3);
        assert_eq!(
            reader.read_entry(0).unwrap(),
            ArchiveEntry::new("module.prop", b"id=test\n".to_vec())
        );
    }

    #[test]
    fn test_reader_enumerates_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_zip(temp_dir.path());
        let mut reader = ArchiveReader::open(&path).unwrap();

        assert_eq!(reader.len(), 3);
        assert_eq!(reader.entry_name(0).unwrap(), "module.prop");
        assert_eq!(reader.entry_name(1).unwrap(), "system/");
        assert_eq!(
            reader.entry_name(2).unwrap(),
            "META-INF/com/google/android/updater-script"
        );
    }

    #[test]
    fn test_read_entry_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_zip(temp_dir.path());
        let mut reader = ArchiveReader::open(&path).unwrap();

        let entry = reader.read_entry(0).unwrap();
        assert_eq!(entry, ArchiveEntry::new("module.prop", b"id=test\n".to_vec()));

        let dir = reader.read_entry(1).unwrap();
        assert!(dir.content.is_empty());
    }

    #[test]
    fn test_read_entry_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_zip(temp_dir.path());
        let mut reader = ArchiveReader::open(&path).unwrap();
        assert!(matches!(reader.read_entry(10), Err(Error::ArchiveRead(_))));
    }

    #[test]
    fn test_open_empty_archive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.zip");
        let zip = ZipWriter::new(File::create(&path).unwrap());
        zip.finish().unwrap();

        let reader = ArchiveReader::open(&path).unwrap();
        assert!(reader.is_empty());
        assert_eq!(reader.path(), path.as_path());
    }
}
