//! Error types for zipsign operations.
//!
//! This module defines the [`enum@Error`] enum covering every failure case
//! of the signing pipeline: credential loading, archive reading, manifest
//! construction, CMS generation and archive writing.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for zipsign operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// None of these conditions is retried internally; each aborts the run.
///
/// # Examples
///
/// ```no_run
/// use zipsign::{Error, ZipSigner};
///
/// let result = ZipSigner::new()
///     .private_key("key.pem")
///     .certificate("cert.pem")
///     .sign("input.zip", "output.zip");
/// match result {
///     Ok(_) => println!("Signed successfully"),
///     Err(Error::Credential(msg)) => eprintln!("Bad key or certificate: {msg}"),
///     Err(Error::Io(e)) => eprintln!("IO error: {e}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not a readable ZIP archive.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Private key or certificate is unreadable, malformed or mismatched.
    ///
    /// Always raised before the output archive is opened.
    #[error("Invalid signing credentials: {0}")]
    Credential(String),

    /// An entry of the input archive could not be read or failed its CRC check.
    #[error("Failed to read archive entry: {0}")]
    ArchiveRead(String),

    /// The output archive could not be written or persisted.
    #[error("Failed to write output archive: {0}")]
    ArchiveWrite(String),

    /// Manifest or signature-file text could not be built or split.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// CMS signature generation failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Signing was attempted without credentials configured.
    ///
    /// See [`crate::ZipSigner::credentials`] and [`crate::ZipSigner::private_key`].
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Invalid builder configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}
