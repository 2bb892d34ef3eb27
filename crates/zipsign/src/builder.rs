//! ZipSigner builder API
//!
//! Provides a builder pattern interface for signing ZIP archives with a
//! JAR-style v1 signature: `META-INF/MANIFEST.MF`, `META-INF/<NAME>.SF` and
//! a detached CMS block `META-INF/<NAME>.EC` or `META-INF/<NAME>.RSA`.

use crate::archive::{ArchiveAssembler, ArchiveReader, CompressionLevel, MetadataEntry};
use crate::crypto::SignatureBlockSigner;
use crate::digest::DigestAlgorithm;
use crate::manifest::{
    ManifestBuilder, SerializedManifest, SignatureFileBuilder, DEFAULT_CREATED_BY, MANIFEST_NAME,
    META_INF_PREFIX,
};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default base name of the signature file and signature block.
pub const DEFAULT_SIGNATURE_BLOCK_NAME: &str = "CERT";

/// ZIP archive signer with builder pattern API.
///
/// # Example
///
/// ```no_run
/// use zipsign::ZipSigner;
///
/// ZipSigner::new()
///     .private_key("key.pem")
///     .certificate("cert.pem")
///     .created_by("Hymo Signer")
///     .sign("module.zip", "module-signed.zip")?;
/// # Ok::<(), zipsign::Error>(())
/// ```
pub struct ZipSigner {
    certificate: Option<PathBuf>,
    private_key: Option<PathBuf>,
    credentials: Option<Box<dyn SignatureBlockSigner>>,
    created_by: String,
    digest_algorithm: DigestAlgorithm,
    compression_level: CompressionLevel,
    signature_block_name: String,
}

/// The three generated metadata files of one signing run.
#[derive(Debug, Clone)]
pub struct SignatureArtifacts {
    /// Manifest bytes with entry section spans.
    pub manifest: SerializedManifest,
    /// Archive path of the signature file, e.g. `META-INF/CERT.SF`.
    pub signature_file_name: String,
    /// Signature-file bytes, exactly as signed.
    pub signature_file: Vec<u8>,
    /// Archive path of the signature block, e.g. `META-INF/CERT.EC`.
    pub signature_block_name: String,
    /// DER-encoded detached CMS SignedData.
    pub signature_block: Vec<u8>,
}

impl SignatureArtifacts {
    /// Metadata entries in the order they are appended to the archive.
    pub fn metadata_entries(&self) -> Vec<MetadataEntry> {
        vec![
            MetadataEntry::new(MANIFEST_NAME, self.manifest.as_bytes().to_vec()),
            MetadataEntry::new(self.signature_file_name.as_str(), self.signature_file.clone()),
            MetadataEntry::new(
                self.signature_block_name.as_str(),
                self.signature_block.clone(),
            ),
        ]
    }
}

impl ZipSigner {
    /// Create a new ZipSigner builder.
    pub fn new() -> Self {
        Self {
            certificate: None,
            private_key: None,
            credentials: None,
            created_by: DEFAULT_CREATED_BY.to_string(),
            digest_algorithm: DigestAlgorithm::default(),
            compression_level: CompressionLevel::DEFAULT,
            signature_block_name: DEFAULT_SIGNATURE_BLOCK_NAME.to_string(),
        }
    }

    /// Set certificate file path (PEM format).
    ///
    /// Use together with `private_key()`. Alternatively, use `credentials()`
    /// with an already loaded identity.
    pub fn certificate(mut self, path: impl AsRef<Path>) -> Self {
        self.certificate = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set private key file path (PKCS#8 PEM format).
    pub fn private_key(mut self, path: impl AsRef<Path>) -> Self {
        self.private_key = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set an already loaded signing backend.
    pub fn credentials(mut self, signer: impl SignatureBlockSigner + 'static) -> Self {
        self.credentials = Some(Box::new(signer));
        self
    }

    /// Set the `Created-By` header of the manifest and signature file.
    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Set the digest algorithm for manifest and signature-file entries.
    ///
    /// Defaults to SHA-1. The CMS block always uses SHA-256.
    pub fn digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Set ZIP compression level for the generated entries (0-9).
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = CompressionLevel::new(level);
        self
    }

    /// Set the base name of the `.SF` and signature block entries (default `CERT`).
    pub fn signature_block_name(mut self, name: impl Into<String>) -> Self {
        self.signature_block_name = name.into();
        self
    }

    /// Validate the builder configuration.
    ///
    /// Returns an error if:
    /// - Both in-memory credentials and PEM paths are specified
    /// - No credentials are specified
    /// - Only one of certificate/private_key is specified (need both)
    /// - `Created-By` or the signature block name cannot be written safely
    pub fn validate(&self) -> Result<()> {
        let has_credentials = self.credentials.is_some();
        let has_pem = self.certificate.is_some() || self.private_key.is_some();

        if has_credentials && has_pem {
            return Err(Error::Config(
                "Cannot specify both loaded credentials and certificate/key paths".into(),
            ));
        }

        if !has_credentials && !has_pem {
            return Err(Error::MissingCredentials(
                "Must specify either credentials or a certificate/key pair".into(),
            ));
        }

        if has_pem && (self.certificate.is_none() || self.private_key.is_none()) {
            return Err(Error::MissingCredentials(
                "Both certificate and private key must be specified".into(),
            ));
        }

        if self.created_by.is_empty() || self.created_by.contains(['\r', '\n']) {
            return Err(Error::Config(format!(
                "Invalid Created-By value: {:?}",
                self.created_by
            )));
        }

        let name = &self.signature_block_name;
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Config(format!(
                "Invalid signature block name: {:?}",
                name
            )));
        }

        Ok(())
    }

    /// Resolve the configured signing backend, loading PEM files if needed.
    fn load_signer(&self) -> Result<Box<dyn SignatureBlockSigner + '_>> {
        self.validate()?;

        if let Some(ref signer) = self.credentials {
            return Ok(Box::new(&**signer));
        }

        let cert = self
            .certificate
            .as_ref()
            .ok_or_else(|| Error::MissingCredentials("No certificate configured".into()))?;
        let key = self
            .private_key
            .as_ref()
            .ok_or_else(|| Error::MissingCredentials("No private key configured".into()))?;

        load_pem_signer(key, cert)
    }

    /// Generate manifest, signature file and signature block for `reader`.
    ///
    /// Does not write anything; see [`ZipSigner::sign`] for the full pipeline.
    pub fn generate(
        &self,
        signer: &dyn SignatureBlockSigner,
        reader: &mut ArchiveReader,
    ) -> Result<SignatureArtifacts> {
        let mut manifest_builder =
            ManifestBuilder::new(self.digest_algorithm, self.created_by.as_str());
        manifest_builder.add_archive(reader)?;
        let manifest = manifest_builder.build().serialize();
        debug!(
            entries = manifest.sections().len(),
            len = manifest.as_bytes().len(),
            "built manifest"
        );

        let signature_file =
            SignatureFileBuilder::new(self.digest_algorithm, self.created_by.as_str())
                .build(&manifest)
                .to_bytes();
        debug!(len = signature_file.len(), "built signature file");

        let signature_block = signer.sign_detached(&signature_file)?;

        Ok(SignatureArtifacts {
            manifest,
            signature_file_name: format!("{}{}.SF", META_INF_PREFIX, self.signature_block_name),
            signature_file,
            signature_block_name: format!(
                "{}{}.{}",
                META_INF_PREFIX,
                self.signature_block_name,
                signer.key_family().block_extension()
            ),
            signature_block,
        })
    }

    /// Sign an archive.
    ///
    /// Loads credentials first, so a bad key or certificate aborts before
    /// the output path is touched. The output is written to a temporary file
    /// and renamed into place on success.
    ///
    /// # Arguments
    ///
    /// * `input` - Path to the input ZIP archive
    /// * `output` - Path for the signed output archive
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Credentials are missing or cannot be loaded
    /// - The input cannot be opened or an entry cannot be read
    /// - CMS signing fails
    /// - The output archive cannot be written
    pub fn sign(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<SignatureArtifacts> {
        let input = input.as_ref();
        let output = output.as_ref();

        let signer = self.load_signer()?;
        let mut reader = ArchiveReader::open(input)?;

        let artifacts = self.generate(signer.as_ref(), &mut reader)?;

        ArchiveAssembler::new()
            .compression_level(self.compression_level)
            .assemble(&mut reader, output, &artifacts.metadata_entries())?;

        info!(
            input = %input.display(),
            output = %output.display(),
            entries = artifacts.manifest.sections().len(),
            block = %artifacts.signature_block_name,
            "signed archive"
        );

        Ok(artifacts)
    }
}

impl Default for ZipSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "pure-rust")]
fn load_pem_signer(key: &Path, cert: &Path) -> Result<Box<dyn SignatureBlockSigner>> {
    Ok(Box::new(crate::crypto::SigningIdentity::from_pem_files(key, cert)?))
}

#[cfg(all(feature = "openssl-backend", not(feature = "pure-rust")))]
fn load_pem_signer(key: &Path, cert: &Path) -> Result<Box<dyn SignatureBlockSigner>> {
    Ok(Box::new(crate::crypto::OpensslIdentity::from_pem_files(key, cert)?))
}

#[cfg(not(any(feature = "pure-rust", feature = "openssl-backend")))]
fn load_pem_signer(_key: &Path, _cert: &Path) -> Result<Box<dyn SignatureBlockSigner>> {
    Err(Error::Config(
        "No signing backend compiled in; enable `pure-rust` or `openssl-backend`".into(),
    ))
}
