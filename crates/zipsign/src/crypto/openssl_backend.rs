//! OpenSSL-backed signing identity.
//!
//! Produces the signature block with `PKCS7_sign` in detached binary mode.

use super::{KeyFamily, SignatureBlockSigner};
use crate::{Error, Result};
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{Id, PKey, Private};
use openssl::stack::Stack;
use openssl::x509::X509;
use std::fs;
use std::path::Path;

/// Certificate and private key loaded through OpenSSL.
pub struct OpensslIdentity {
    certificate: X509,
    private_key: PKey<Private>,
    key_family: KeyFamily,
}

impl OpensslIdentity {
    /// Load from PEM-encoded certificate and private key bytes.
    ///
    /// Accepts PKCS#8 as well as traditional RSA/EC PEM keys.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let certificate = X509::from_pem(cert_pem)
            .map_err(|e| Error::Credential(format!("Failed to load certificate: {}", e)))?;

        let private_key = PKey::private_key_from_pem(key_pem)
            .map_err(|e| Error::Credential(format!("Failed to load private key: {}", e)))?;

        let key_family = match private_key.id() {
            Id::RSA => KeyFamily::Rsa,
            Id::EC => KeyFamily::Ec,
            other => {
                return Err(Error::Credential(format!(
                    "Unsupported key algorithm for a signature block: {:?}",
                    other
                )))
            }
        };

        Self::validate_key_pair(&certificate, &private_key)?;

        Ok(Self {
            certificate,
            private_key,
            key_family,
        })
    }

    /// Read and load the key and certificate files.
    pub fn from_pem_files(key_path: impl AsRef<Path>, cert_path: impl AsRef<Path>) -> Result<Self> {
        let key_path = key_path.as_ref();
        let cert_path = cert_path.as_ref();

        let key_pem = fs::read(key_path)
            .map_err(|e| Error::Credential(format!("{}: {}", key_path.display(), e)))?;
        let cert_pem = fs::read(cert_path)
            .map_err(|e| Error::Credential(format!("{}: {}", cert_path.display(), e)))?;

        Self::from_pem(&cert_pem, &key_pem)
    }

    /// Validate that the private key matches the certificate's public key
    fn validate_key_pair(cert: &X509, private_key: &PKey<Private>) -> Result<()> {
        let cert_public_key = cert.public_key().map_err(|e| {
            Error::Credential(format!(
                "Failed to extract public key from certificate: {}",
                e
            ))
        })?;

        if !private_key.public_eq(&cert_public_key) {
            return Err(Error::Credential(
                "Private key does not match certificate public key".into(),
            ));
        }

        Ok(())
    }
}

impl SignatureBlockSigner for OpensslIdentity {
    fn key_family(&self) -> KeyFamily {
        self.key_family
    }

    fn sign_detached(&self, content: &[u8]) -> Result<Vec<u8>> {
        let chain = Stack::<X509>::new()
            .map_err(|e| Error::Signing(format!("Failed to allocate certificate stack: {}", e)))?;

        let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY | Pkcs7Flags::NOSMIMECAP;
        let pkcs7 = Pkcs7::sign(&self.certificate, &self.private_key, &chain, content, flags)
            .map_err(|e| Error::Signing(format!("PKCS7_sign failed: {}", e)))?;

        pkcs7
            .to_der()
            .map_err(|e| Error::Signing(format!("Failed to encode PKCS#7: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EC_KEY: &[u8] = include_bytes!("../../tests/fixtures/ec_key.pem");
    const EC_CERT: &[u8] = include_bytes!("../../tests/fixtures/ec_cert.pem");
    const RSA_KEY: &[u8] = include_bytes!("../../tests/fixtures/rsa_key.pem");
    const RSA_CERT: &[u8] = include_bytes!("../../tests/fixtures/rsa_cert.pem");

    #[test]
    fn test_openssl_identity_families() {
        let ec = OpensslIdentity::from_pem(EC_CERT, EC_KEY).unwrap();
        assert_eq!(ec.key_family(), KeyFamily::Ec);

        let rsa = OpensslIdentity::from_pem(RSA_CERT, RSA_KEY).unwrap();
        assert_eq!(rsa.key_family(), KeyFamily::Rsa);
    }

    #[test]
    fn test_openssl_identity_mismatch() {
        assert!(matches!(
            OpensslIdentity::from_pem(EC_CERT, RSA_KEY),
            Err(Error::Credential(_))
        ));
    }

    #[test]
    fn test_openssl_sign_detached_verifies() {
        use openssl::x509::store::X509StoreBuilder;

        let identity = OpensslIdentity::from_pem(RSA_CERT, RSA_KEY).unwrap();
        let content = b"Signature-Version: 1.0\r\n\r\n";
        let der = identity.sign_detached(content).unwrap();

        let pkcs7 = Pkcs7::from_der(&der).unwrap();
        let certs = Stack::<X509>::new().unwrap();
        let store = X509StoreBuilder::new().unwrap().build();
        let mut out = Vec::new();
        pkcs7
            .verify(
                &certs,
                &store,
                Some(content),
                Some(&mut out),
                Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
            )
            .unwrap();
        assert_eq!(out, content.to_vec());
    }
}
