//! Error types for the archive crate.

use thiserror::Error;

/// Errors that can occur when reading LPK packages.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ZIP container could not be read.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entry not found under either its plain or hashed name.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The package manifest is unreadable.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// The manifest names a scheme we do not know how to derive keys for.
    #[error("unsupported package scheme: {0}")]
    UnsupportedScheme(String),

    /// An encrypted workshop package was opened without its secrets file.
    #[error("workshop packages need the config.json secrets file to be decrypted")]
    MissingSecrets,
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
