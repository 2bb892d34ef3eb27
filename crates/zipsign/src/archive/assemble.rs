//! Signed archive assembly.
//!
//! Copies every entry of the input archive unchanged and appends the
//! generated signing metadata.
//!
//! # Atomicity
//!
//! The archive is written to a temporary file next to the output path and
//! renamed into place only after the ZIP has been finalized. A failed run
//! leaves no output behind and never touches an existing file at the
//! output path.

use super::ArchiveReader;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// ZIP compression level for the generated metadata entries.
///
/// Copied entries keep their original compression; this level applies only
/// to the manifest, signature file and signature block.
///
/// # Examples
///
/// ```
/// use zipsign::archive::CompressionLevel;
///
/// let fast = CompressionLevel::NONE;
/// let balanced = CompressionLevel::DEFAULT;
///
/// // Values above 9 are clamped
/// let custom = CompressionLevel::new(30);
/// assert_eq!(custom.level(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// Stored, no compression (level 0).
    pub const NONE: CompressionLevel = CompressionLevel(0);

    /// Deflate level 6.
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Deflate level 9.
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Creates a compression level from 0-9.
    ///
    /// Values greater than 9 are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.min(9))
    }

    /// Returns the compression level value (0-9).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }

    fn file_options(&self) -> SimpleFileOptions {
        let options = if self.0 == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.0 as i64))
        };
        options.unix_permissions(0o644)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// A generated entry appended after the copied ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Archive path, e.g. `META-INF/CERT.SF`.
    pub name: String,
    /// Entry bytes.
    pub content: Vec<u8>,
}

impl MetadataEntry {
    /// Create a metadata entry.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

/// Writes the signed output archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveAssembler {
    compression_level: CompressionLevel,
}

impl ArchiveAssembler {
    /// Create an assembler using [`CompressionLevel::DEFAULT`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression level for appended entries.
    pub fn compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Copy `source` into a new archive at `output_path` and append `metadata`.
    ///
    /// Original entries are raw-copied in their original order. An input
    /// entry whose name equals one of the `metadata` names is replaced by
    /// the generated entry instead of being copied. Metadata entries are
    /// appended in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveRead`] if an input entry cannot be read and
    /// [`Error::ArchiveWrite`] if the output cannot be created, written or
    /// renamed into place.
    pub fn assemble(
        &self,
        source: &mut ArchiveReader,
        output_path: impl AsRef<Path>,
        metadata: &[MetadataEntry],
    ) -> Result<()> {
        let output_path = output_path.as_ref();

        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::ArchiveWrite(format!("creating {}: {}", parent.display(), e))
            })?;
        }

        let mut temp = create_temp_file(parent, output_path).map_err(|e| {
            Error::ArchiveWrite(format!(
                "creating temporary file in {}: {}",
                parent.display(),
                e
            ))
        })?;

        self.write_archive(source, temp.as_file_mut(), metadata)?;

        temp.as_file()
            .sync_all()
            .map_err(|e| Error::ArchiveWrite(format!("syncing output: {}", e)))?;
        temp.persist(output_path).map_err(|e| {
            Error::ArchiveWrite(format!("{}: {}", output_path.display(), e.error))
        })?;

        debug!(output = %output_path.display(), "output archive persisted");
        Ok(())
    }

    fn write_archive(
        &self,
        source: &mut ArchiveReader,
        target: &mut fs::File,
        metadata: &[MetadataEntry],
    ) -> Result<()> {
        let replaced: HashSet<&str> = metadata.iter().map(|m| m.name.as_str()).collect();
        let mut zip = ZipWriter::new(target);

        for index in 0..source.len() {
            let name = source.entry_name(index)?;
            if replaced.contains(name.as_str()) {
                warn!(name = %name, "replacing existing signing metadata entry");
                continue;
            }
            source.raw_copy_into(index, &mut zip)?;
        }

        let options = self.compression_level.file_options();
        for entry in metadata {
            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| Error::ArchiveWrite(format!("{}: {}", entry.name, e)))?;
            zip.write_all(&entry.content)
                .map_err(|e| Error::ArchiveWrite(format!("{}: {}", entry.name, e)))?;
        }

        zip.finish()
            .map_err(|e| Error::ArchiveWrite(format!("finalizing archive: {}", e)))?;

        Ok(())
    }
}

/// Temporary output file next to `output_path`.
///
/// Takes the mode of an existing output; otherwise the file is created the
/// way `File::create` would, with 0o666 masked by the process umask.
fn create_temp_file(parent: &Path, output_path: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".zipsign");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let temp = builder.tempfile_in(parent)?;

    if let Ok(existing) = fs::metadata(output_path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }

    Ok(temp)
}
