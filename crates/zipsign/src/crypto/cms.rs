//! Detached CMS signing for the signature block
//!
//! Uses cryptographic-message-syntax crate for CMS SignedData generation.
//! The signer uses its default SHA-256 message digest, so the block is
//! independent of the manifest digest algorithm.

use super::{KeyFamily, SignatureBlockSigner, SigningIdentity};
use crate::{Error, Result};
use cryptographic_message_syntax::{SignedDataBuilder, SignerBuilder};
use tracing::debug;

/// Generate a detached CMS signature over `data`.
///
/// # Arguments
///
/// * `data` - The signature-file bytes; not embedded in the output
/// * `identity` - Signing key and certificate; the certificate is embedded
pub fn sign_detached(data: &[u8], identity: &SigningIdentity) -> Result<Vec<u8>> {
    let signer = SignerBuilder::new(&identity.signing_key, identity.certificate.clone());

    let der = SignedDataBuilder::default()
        .content_external(data.to_vec())
        .signer(signer)
        .build_der()
        .map_err(|e| Error::Signing(format!("Failed to build CMS signature: {}", e)))?;

    debug!(len = der.len(), "built detached CMS signature");
    Ok(der)
}

impl SignatureBlockSigner for SigningIdentity {
    fn key_family(&self) -> KeyFamily {
        SigningIdentity::key_family(self)
    }

    fn sign_detached(&self, content: &[u8]) -> Result<Vec<u8>> {
        sign_detached(content, self)
    }
}
