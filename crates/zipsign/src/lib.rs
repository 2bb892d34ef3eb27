//! JAR-style v1 signing for ZIP archives.
//!
//! Adds `META-INF/MANIFEST.MF`, `META-INF/CERT.SF` and a detached CMS
//! signature block (`META-INF/CERT.EC` or `META-INF/CERT.RSA`) to a ZIP
//! archive, copying every original entry through unchanged.

pub mod archive;
pub mod builder;
pub mod crypto;
pub mod digest;
pub mod error;
pub mod manifest;

pub use archive::{validate_archive, ArchiveReader, CompressionLevel};
pub use builder::{SignatureArtifacts, ZipSigner};
#[cfg(feature = "openssl-backend")]
pub use crypto::OpensslIdentity;
#[cfg(feature = "pure-rust")]
pub use crypto::SigningIdentity;
pub use crypto::{KeyFamily, SignatureBlockSigner};
pub use digest::{DigestAlgorithm, DigestValue};
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
