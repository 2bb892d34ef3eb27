//! Signing identities and detached CMS signature blocks.
//!
//! [`SignatureBlockSigner`] is the seam between the text-generation stages
//! and the cryptographic backend. Two backends are provided:
//!
//! - [`SigningIdentity`] (feature `pure-rust`, default): `x509-certificate`
//!   key handling and `cryptographic-message-syntax` SignedData.
//! - [`OpensslIdentity`] (feature `openssl-backend`): OpenSSL PKCS#7.

#[cfg(feature = "pure-rust")]
pub mod cms;
#[cfg(feature = "pure-rust")]
pub mod identity;
#[cfg(feature = "openssl-backend")]
pub mod openssl_backend;

#[cfg(feature = "pure-rust")]
pub use identity::SigningIdentity;
#[cfg(feature = "openssl-backend")]
pub use openssl_backend::OpensslIdentity;

use crate::Result;

/// Public-key family of a signing key.
///
/// Determines the extension of the signature block entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    /// RSA keys, stored as `<NAME>.RSA`.
    Rsa,
    /// Elliptic-curve (ECDSA) keys, stored as `<NAME>.EC`.
    Ec,
}

impl KeyFamily {
    /// Extension of the signature block entry (`RSA` or `EC`).
    pub fn block_extension(self) -> &'static str {
        match self {
            KeyFamily::Rsa => "RSA",
            KeyFamily::Ec => "EC",
        }
    }
}

/// Produces a detached signature container over signature-file bytes.
///
/// Implementations must emit a DER-encoded CMS `SignedData` with exactly
/// one signer, a SHA-256 message digest, the signing certificate embedded,
/// and no encapsulated content.
pub trait SignatureBlockSigner {
    /// Family of the signing key.
    fn key_family(&self) -> KeyFamily;

    /// Sign `content` and return the DER-encoded detached container.
    fn sign_detached(&self, content: &[u8]) -> Result<Vec<u8>>;
}

impl<T: SignatureBlockSigner + ?Sized> SignatureBlockSigner for &T {
    fn key_family(&self) -> KeyFamily {
        (**self).key_family()
    }

    fn sign_detached(&self, content: &[u8]) -> Result<Vec<u8>> {
        (**self).sign_detached(content)
    }
}

impl<T: SignatureBlockSigner + ?Sized> SignatureBlockSigner for Box<T> {
    fn key_family(&self) -> KeyFamily {
        (**self).key_family()
    }

    fn sign_detached(&self, content: &[u8]) -> Result<Vec<u8>> {
        (**self).sign_detached(content)
    }
}
