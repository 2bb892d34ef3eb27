//! Certificate and private key loading for archive signing.
//!
//! Loads a PEM-encoded X.509 certificate and an unencrypted PKCS#8 PEM
//! private key. RSA (2048 bits or more) and ECDSA (P-256, P-384) keys are
//! supported; Ed25519 keys have no signature-block extension and are
//! rejected.
//!
//! # Examples
//!
//! ```no_run
//! use zipsign::crypto::SigningIdentity;
//!
//! let identity = SigningIdentity::from_pem_files("private_key.pem", "certificate.pem")?;
//! println!("Signing as {:?}", identity.subject_common_name());
//! # Ok::<(), zipsign::Error>(())
//! ```

use super::KeyFamily;
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use x509_certificate::{CapturedX509Certificate, InMemorySigningKeyPair, KeyAlgorithm, Sign};

/// Certificate and matching private key.
///
/// # Security
///
/// The private key is held in memory for the lifetime of this value.
/// Avoid logging or exposing [`SigningIdentity`] instances.
pub struct SigningIdentity {
    pub(crate) certificate: CapturedX509Certificate,
    pub(crate) signing_key: InMemorySigningKeyPair,
    key_family: KeyFamily,
}

impl SigningIdentity {
    /// Load credentials from PEM-encoded certificate and private key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] if:
    /// - The certificate PEM is malformed or invalid
    /// - The private key PEM is empty, malformed or not PKCS#8
    /// - The key is neither RSA nor ECDSA
    /// - The key does not belong to the certificate
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let certificate = CapturedX509Certificate::from_pem(cert_pem)
            .map_err(|e| Error::Credential(format!("Failed to parse certificate PEM: {}", e)))?;

        let signing_key = InMemorySigningKeyPair::from_pkcs8_pem(key_pem)
            .map_err(|e| Error::Credential(format!("Failed to parse private key PEM: {}", e)))?;

        let key_family = match signing_key.key_algorithm() {
            Some(KeyAlgorithm::Rsa) => KeyFamily::Rsa,
            Some(KeyAlgorithm::Ecdsa(_)) => KeyFamily::Ec,
            Some(other) => {
                return Err(Error::Credential(format!(
                    "Unsupported key algorithm for a signature block: {:?}",
                    other
                )))
            }
            None => {
                return Err(Error::Credential(
                    "Unable to determine the private key algorithm".into(),
                ))
            }
        };

        if signing_key.public_key_data() != certificate.public_key_data() {
            return Err(Error::Credential(
                "Private key does not match certificate public key".into(),
            ));
        }

        Ok(Self {
            certificate,
            signing_key,
            key_family,
        })
    }

    /// Read and load the key and certificate files.
    ///
    /// Unreadable files are reported as [`Error::Credential`] naming the path.
    pub fn from_pem_files(key_path: impl AsRef<Path>, cert_path: impl AsRef<Path>) -> Result<Self> {
        let key_path = key_path.as_ref();
        let cert_path = cert_path.as_ref();

        let key_pem = fs::read(key_path)
            .map_err(|e| Error::Credential(format!("{}: {}", key_path.display(), e)))?;
        let cert_pem = fs::read(cert_path)
            .map_err(|e| Error::Credential(format!("{}: {}", cert_path.display(), e)))?;

        Self::from_pem(&cert_pem, &key_pem)
    }

    /// Signing certificate, embedded into every signature block.
    pub fn certificate(&self) -> &CapturedX509Certificate {
        &self.certificate
    }

    /// Key family of the private key.
    pub fn key_family(&self) -> KeyFamily {
        self.key_family
    }

    /// Common name of the certificate subject, if any.
    pub fn subject_common_name(&self) -> Option<String> {
        self.certificate.subject_common_name()
    }
}
