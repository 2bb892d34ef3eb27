//! Signature file (`META-INF/<NAME>.SF`) construction.
//!
//! The signature file carries a digest of the whole manifest in its header
//! and, per entry, a digest of that entry's serialized manifest section.

use super::builder::{ManifestEntry, SerializedManifest};
use super::section::Section;
use super::SIGNATURE_VERSION;
use crate::digest::{DigestAlgorithm, DigestValue};
use tracing::debug;

/// Signature file summarizing a serialized manifest.
#[derive(Debug, Clone)]
pub struct SignatureFile {
    created_by: String,
    digest_algorithm: DigestAlgorithm,
    manifest_digest: DigestValue,
    entries: Vec<ManifestEntry>,
}

impl SignatureFile {
    /// Digest of the complete manifest bytes.
    pub fn manifest_digest(&self) -> &DigestValue {
        &self.manifest_digest
    }

    /// Per-entry digests of manifest sections, in manifest order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Header section: `Signature-Version`, `Created-By` and the manifest digest.
    pub fn main_section(&self) -> Section {
        Section::new()
            .attribute("Signature-Version", SIGNATURE_VERSION)
            .attribute("Created-By", self.created_by.as_str())
            .attribute(
                self.digest_algorithm.manifest_digest_attribute(),
                self.manifest_digest.to_base64(),
            )
    }

    /// Serialize to the exact bytes stored in the archive and signed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.main_section().write_to(&mut out);
        for entry in &self.entries {
            Section::new()
                .attribute("Name", entry.name.as_str())
                .attribute(self.digest_algorithm.digest_attribute(), entry.digest.to_base64())
                .write_to(&mut out);
        }
        out
    }
}

/// Builds a [`SignatureFile`] from serialized manifest bytes.
pub struct SignatureFileBuilder {
    digest_algorithm: DigestAlgorithm,
    created_by: String,
}

impl SignatureFileBuilder {
    /// Create a builder using `digest_algorithm` for both digest levels.
    pub fn new(digest_algorithm: DigestAlgorithm, created_by: impl Into<String>) -> Self {
        Self {
            digest_algorithm,
            created_by: created_by.into(),
        }
    }

    /// Digest the manifest as a whole and each of its entry sections.
    pub fn build(&self, manifest: &SerializedManifest) -> SignatureFile {
        let manifest_digest = self.digest_algorithm.digest(manifest.as_bytes());
        debug!(
            digest = %manifest_digest.to_base64(),
            len = manifest.as_bytes().len(),
            "digested manifest"
        );

        let entries = manifest
            .sections()
            .iter()
            .map(|span| ManifestEntry {
                name: span.name.clone(),
                digest: self.digest_algorithm.digest(manifest.section_bytes(span)),
            })
            .collect();

        SignatureFile {
            created_by: self.created_by.clone(),
            digest_algorithm: self.digest_algorithm,
            manifest_digest,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveEntry;
    use crate::manifest::section::split_sections;
    use crate::manifest::ManifestBuilder;

    fn serialized(entries: &[(&str, &[u8])]) -> SerializedManifest {
        let mut builder = ManifestBuilder::new(DigestAlgorithm::Sha1, "zipsign");
        for (name, content) in entries {
            builder
                .add_entry(&ArchiveEntry::new(*name, content.to_vec()))
                .unwrap();
        }
        builder.build().serialize()
    }

    #[test]
    fn test_hello_signature_file_text() {
        let manifest = serialized(&[("hello.txt", b"hi")]);
        let sf = SignatureFileBuilder::new(DigestAlgorithm::Sha1, "zipsign").build(&manifest);

        assert_eq!(
            sf.to_bytes(),
            b"Signature-Version: 1.0\r\nCreated-By: zipsign\r\n\
SHA1-Digest-Manifest: vWwsqMEVHkYSzyLk/EpKtMD768g=\r\n\r\n\
Name: hello.txt\r\nSHA1-Digest: fZ5ynR9MwVu0QcSkdZPzyhafORc=\r\n\r\n"
                .to_vec()
        );
    }

    #[test]
    fn test_header_digest_matches_manifest_bytes() {
        let manifest = serialized(&[("a", b"1"), ("b", b"2")]);
        let sf = SignatureFileBuilder::new(DigestAlgorithm::Sha1, "zipsign").build(&manifest);
        assert_eq!(
            sf.manifest_digest(),
            &DigestAlgorithm::Sha1.digest(manifest.as_bytes())
        );
    }

    #[test]
    fn test_entry_digests_cover_split_section_ranges() {
        let manifest = serialized(&[("a", b"1"), ("dir/", b""), ("c/d.bin", b"xyz")]);
        let sf = SignatureFileBuilder::new(DigestAlgorithm::Sha1, "zipsign").build(&manifest);

        let ranges = split_sections(manifest.as_bytes()).unwrap();
        assert_eq!(ranges.len(), sf.entries().len() + 1);

        for (entry, range) in sf.entries().iter().zip(ranges.iter().skip(1)) {
            let section_bytes = &manifest.as_bytes()[range.clone()];
            assert_eq!(entry.digest, DigestAlgorithm::Sha1.digest(section_bytes));
            assert!(section_bytes.starts_with(format!("Name: {}\r\n", entry.name).as_bytes()));
            assert!(section_bytes.ends_with(b"\r\n\r\n"));
        }
    }

    #[test]
    fn test_entry_digest_is_not_content_digest() {
        let manifest = serialized(&[("hello.txt", b"hi")]);
        let sf = SignatureFileBuilder::new(DigestAlgorithm::Sha1, "zipsign").build(&manifest);
        assert_ne!(sf.entries()[0].digest, DigestAlgorithm::Sha1.digest(b"hi"));
    }

    #[test]
    fn test_empty_manifest_has_header_only() {
        let manifest = serialized(&[]);
        let sf = SignatureFileBuilder::new(DigestAlgorithm::Sha1, "zipsign").build(&manifest);
        assert!(sf.entries().is_empty());
        let ranges = split_sections(&sf.to_bytes()).unwrap();
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn test_tampered_entry_changes_both_levels() {
        let original = serialized(&[("a", b"1"), ("b", b"2")]);
        let tampered = serialized(&[("a", b"1"), ("b", b"3")]);
        let builder = SignatureFileBuilder::new(DigestAlgorithm::Sha1, "zipsign");
        let sf_original = builder.build(&original);
        let sf_tampered = builder.build(&tampered);

        assert_ne!(sf_original.manifest_digest(), sf_tampered.manifest_digest());
        assert_eq!(sf_original.entries()[0], sf_tampered.entries()[0]);
        assert_ne!(sf_original.entries()[1], sf_tampered.entries()[1]);
    }

    #[test]
    fn test_sha256_header_attribute() {
        let mut builder = ManifestBuilder::new(DigestAlgorithm::Sha256, "zipsign");
        builder
            .add_entry(&ArchiveEntry::new("x", b"x".to_vec()))
            .unwrap();
        let manifest = builder.build().serialize();
        let sf = SignatureFileBuilder::new(DigestAlgorithm::Sha256, "zipsign").build(&manifest);
        let text = String::from_utf8(sf.to_bytes()).unwrap();
        assert!(text.contains("\r\nSHA-256-Digest-Manifest: "));
        assert!(text.contains("Name: x\r\nSHA-256-Digest: "));
    }
}
