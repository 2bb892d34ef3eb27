//! Manifest and signature-file generation.
//!
//! Text layout shared by both files:
//!
//! ```text
//! Manifest-Version: 1.0\r\n
//! Created-By: zipsign\r\n
//! \r\n
//! Name: hello.txt\r\n
//! SHA1-Digest: witfkXg0JglCjW9RssWvTAveakI=\r\n
//! \r\n
//! ```

pub mod builder;
pub mod section;
pub mod signature_file;

pub use builder::{Manifest, ManifestBuilder, ManifestEntry, SectionSpan, SerializedManifest};
pub use section::{split_sections, Section};
pub use signature_file::{SignatureFile, SignatureFileBuilder};

use crate::{Error, Result};

/// Entries under this prefix are signing metadata and are never digested.
///
/// This is a case-sensitive textual prefix; the ZIP format itself has no
/// notion of metadata entries.
pub const META_INF_PREFIX: &str = "META-INF/";

/// Archive path of the manifest.
pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";

/// `Manifest-Version` header value.
pub const MANIFEST_VERSION: &str = "1.0";

/// `Signature-Version` header value.
pub const SIGNATURE_VERSION: &str = "1.0";

/// Default `Created-By` header value.
pub const DEFAULT_CREATED_BY: &str = "zipsign";

/// Whether `name` is a signing-metadata entry.
pub fn is_metadata_entry(name: &str) -> bool {
    name.starts_with(META_INF_PREFIX)
}

/// Reject names that would break the line-oriented text format.
pub(crate) fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Manifest("Archive entry has an empty name".into()));
    }
    if name.contains(['\r', '\n', '\0']) {
        return Err(Error::Manifest(format!(
            "Entry name cannot be written to a manifest: {:?}",
            name
        )));
    }
    Ok(())
}
