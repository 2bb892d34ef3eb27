//! Digest manifest (`META-INF/MANIFEST.MF`) construction.

use super::section::{split_sections, Section};
use super::{is_metadata_entry, validate_entry_name, MANIFEST_VERSION};
use crate::archive::{ArchiveEntry, ArchiveReader};
use crate::digest::{DigestAlgorithm, DigestValue};
use crate::{Error, Result};
use std::collections::HashMap;
use std::ops::Range;
use tracing::debug;

/// Digest of one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Archive entry name.
    pub name: String,
    /// Digest of the entry content.
    pub digest: DigestValue,
}

/// Ordered digest manifest of an archive.
#[derive(Debug, Clone)]
pub struct Manifest {
    created_by: String,
    digest_algorithm: DigestAlgorithm,
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Entries in archive enumeration order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Value of the `Created-By` header.
    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Algorithm used for every entry digest.
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    /// Header section: `Manifest-Version` and `Created-By`.
    pub fn main_section(&self) -> Section {
        Section::new()
            .attribute("Manifest-Version", MANIFEST_VERSION)
            .attribute("Created-By", self.created_by.as_str())
    }

    fn entry_section(&self, entry: &ManifestEntry) -> Section {
        Section::new()
            .attribute("Name", entry.name.as_str())
            .attribute(self.digest_algorithm.digest_attribute(), entry.digest.to_base64())
    }

    /// Serialize to the exact bytes stored as `META-INF/MANIFEST.MF`.
    ///
    /// The span of every entry section is recorded while writing, so later
    /// stages digest precisely the bytes that end up in the archive.
    pub fn serialize(&self) -> SerializedManifest {
        let mut bytes = Vec::new();
        self.main_section().write_to(&mut bytes);

        let mut sections = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let start = bytes.len();
            self.entry_section(entry).write_to(&mut bytes);
            sections.push(SectionSpan {
                name: entry.name.clone(),
                range: start..bytes.len(),
            });
        }

        SerializedManifest { bytes, sections }
    }
}

/// Name and byte range of one entry section inside serialized manifest text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    /// Value of the section's `Name` attribute.
    pub name: String,
    /// Byte range including the terminating blank line.
    pub range: Range<usize>,
}

/// Manifest bytes together with the location of each entry section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedManifest {
    bytes: Vec<u8>,
    sections: Vec<SectionSpan>,
}

impl SerializedManifest {
    /// Recover section spans from existing manifest bytes.
    ///
    /// The first section is the header; every following section must carry
    /// a `Name` attribute.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let ranges = split_sections(&bytes)?;
        let mut ranges = ranges.into_iter();

        if ranges.next().is_none() {
            return Err(Error::Manifest("Manifest has no header section".into()));
        }

        let mut sections = Vec::new();
        for range in ranges {
            let section = Section::parse(&bytes[range.clone()])?;
            let name = section
                .name()
                .ok_or_else(|| {
                    Error::Manifest(format!(
                        "Section at offset {} has no Name attribute",
                        range.start
                    ))
                })?
                .to_string();
            sections.push(SectionSpan { name, range });
        }

        Ok(Self { bytes, sections })
    }

    /// Full manifest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the manifest bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Entry section spans in manifest order.
    pub fn sections(&self) -> &[SectionSpan] {
        &self.sections
    }

    /// Exact bytes of one entry section.
    pub fn section_bytes(&self, span: &SectionSpan) -> &[u8] {
        &self.bytes[span.range.clone()]
    }
}

/// Builds a [`Manifest`] from archive entries.
///
/// Entries under `META-INF/` are skipped; every other entry is digested in
/// the order it is added.
///
/// # Examples
///
/// ```
/// use zipsign::archive::ArchiveEntry;
/// use zipsign::manifest::ManifestBuilder;
/// use zipsign::DigestAlgorithm;
///
/// let mut builder = ManifestBuilder::new(DigestAlgorithm::Sha1, "zipsign");
/// builder.add_entry(&ArchiveEntry::new("hello.txt", b"hi".to_vec()))?;
/// builder.add_entry(&ArchiveEntry::new("META-INF/MANIFEST.MF", Vec::new()))?;
/// let manifest = builder.build();
/// assert_eq!(manifest.entries().len(), 1);
/// # Ok::<(), zipsign::Error>(())
/// ```
pub struct ManifestBuilder {
    digest_algorithm: DigestAlgorithm,
    created_by: String,
    entries: Vec<ManifestEntry>,
    positions: HashMap<String, usize>,
}

impl ManifestBuilder {
    /// Create a builder using `digest_algorithm` for entry digests.
    pub fn new(digest_algorithm: DigestAlgorithm, created_by: impl Into<String>) -> Self {
        Self {
            digest_algorithm,
            created_by: created_by.into(),
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Digest one entry. Returns `false` if it was skipped as metadata.
    ///
    /// A repeated name keeps its first position and takes the digest of the
    /// latest content.
    pub fn add_entry(&mut self, entry: &ArchiveEntry) -> Result<bool> {
        if is_metadata_entry(&entry.name) {
            debug!(name = %entry.name, "skipping metadata entry");
            return Ok(false);
        }
        validate_entry_name(&entry.name)?;

        let digest = self.digest_algorithm.digest(&entry.content);
        debug!(
            name = %entry.name,
            size = entry.content.len(),
            digest = %digest.to_base64(),
            "digested entry"
        );

        match self.positions.get(&entry.name) {
            Some(&index) => self.entries[index].digest = digest,
            None => {
                self.positions.insert(entry.name.clone(), self.entries.len());
                self.entries.push(ManifestEntry {
                    name: entry.name.clone(),
                    digest,
                });
            }
        }

        Ok(true)
    }

    /// Digest every non-metadata entry of `reader`, one entry in memory at a time.
    pub fn add_archive(&mut self, reader: &mut ArchiveReader) -> Result<()> {
        for index in 0..reader.len() {
            let name = reader.entry_name(index)?;
            if is_metadata_entry(&name) {
                debug!(name = %name, "skipping metadata entry");
                continue;
            }
            let entry = reader.read_entry(index)?;
            self.add_entry(&entry)?;
        }
        Ok(())
    }

    /// Finish the manifest.
    pub fn build(self) -> Manifest {
        Manifest {
            created_by: self.created_by,
            digest_algorithm: self.digest_algorithm,
            entries: self.entries,
        }
    }
}
