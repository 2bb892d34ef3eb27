//! Digest algorithms used by the manifest and signature file.
//!
//! The algorithm set is closed: SHA-1 (the classic JAR default) and SHA-256.
//! The CMS signature block always uses SHA-256 for its message digest,
//! independently of the algorithm chosen here.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::fmt;

/// Digest algorithm for manifest and signature-file entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-1, attribute prefix `SHA1`.
    #[default]
    Sha1,
    /// SHA-256, attribute prefix `SHA-256`.
    Sha256,
}

impl DigestAlgorithm {
    /// Compute the digest of `data`.
    pub fn digest(self, data: &[u8]) -> DigestValue {
        let bytes = match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        };
        DigestValue {
            algorithm: self,
            bytes,
        }
    }

    /// Name prefix used in manifest attributes, e.g. `SHA1` in `SHA1-Digest`.
    pub fn attribute_prefix(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha256 => "SHA-256",
        }
    }

    /// Attribute name carrying a per-entry digest (`SHA1-Digest`).
    pub fn digest_attribute(self) -> String {
        format!("{}-Digest", self.attribute_prefix())
    }

    /// Attribute name carrying the whole-manifest digest (`SHA1-Digest-Manifest`).
    pub fn manifest_digest_attribute(self) -> String {
        format!("{}-Digest-Manifest", self.attribute_prefix())
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_prefix())
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(DigestAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            other => Err(crate::Error::Config(format!(
                "Unsupported digest algorithm: {}",
                other
            ))),
        }
    }
}

/// Digest bytes tagged with the algorithm that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestValue {
    algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl DigestValue {
    /// Algorithm that produced this value.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Standard base64 with padding, as embedded in manifest text.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_known_value() {
        let digest = DigestAlgorithm::Sha1.digest(b"hi");
        assert_eq!(digest.as_bytes().len(), 20);
        assert_eq!(digest.to_base64(), "witfkXg0JglCjW9RssWvTAveakI=");
    }

    #[test]
    fn test_sha1_empty_input() {
        let digest = DigestAlgorithm::Sha1.digest(b"");
        assert_eq!(digest.to_base64(), "2jmj7l5rSw0yVb/vlWAYkK/YBwk=");
    }

    #[test]
    fn test_sha256_known_value() {
        let digest = DigestAlgorithm::Sha256.digest(b"hi");
        assert_eq!(digest.as_bytes().len(), 32);
        assert_eq!(
            digest.to_base64(),
            "j0NDRmSPa5bfid2pAcUXaxCm2Dlh3TwayItZstwyeqQ="
        );
    }

    #[test]
    fn test_digest_deterministic() {
        let a = DigestAlgorithm::Sha1.digest(b"same input");
        let b = DigestAlgorithm::Sha1.digest(b"same input");
        assert_eq!(a, b);
        assert_eq!(a.algorithm(), DigestAlgorithm::Sha1);
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(DigestAlgorithm::Sha1.digest_attribute(), "SHA1-Digest");
        assert_eq!(
            DigestAlgorithm::Sha1.manifest_digest_attribute(),
            "SHA1-Digest-Manifest"
        );
        assert_eq!(DigestAlgorithm::Sha256.digest_attribute(), "SHA-256-Digest");
        assert_eq!(
            DigestAlgorithm::Sha256.manifest_digest_attribute(),
            "SHA-256-Digest-Manifest"
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("sha1".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha1);
        assert_eq!("SHA-256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert!("md5".parse::<DigestAlgorithm>().is_err());
    }
}
