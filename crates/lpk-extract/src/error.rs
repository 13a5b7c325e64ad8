//! Error types for extraction.

use thiserror::Error;

/// Errors that can occur while extracting a package.
#[derive(Debug, Error)]
pub enum Error {
    /// Archive, manifest or key derivation error.
    #[error(transparent)]
    Archive(#[from] lpk_archive::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A model document did not decode to JSON.
    #[error("{reference} is not a valid model document: {reason}")]
    InvalidDocument { reference: String, reason: String },

    /// Neither the configured secrets, the automatic guesses nor the operator
    /// produced a key that decrypts the root model.
    #[error("could not find a working key for {reference}, decryption failed")]
    KeyRecoveryExhausted { reference: String },

    /// Resolving one costume's reference graph failed.
    #[error("costume {index} failed: {source}")]
    CostumeExtraction {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// Writing a rewritten model document failed.
    #[error("failed to write {name}: {source}")]
    DocumentEmission {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Character index out of range.
    #[error("no character with index {0}")]
    NoSuchCharacter(usize),
}

/// Result type for extraction.
pub type Result<T> = std::result::Result<T, Error>;
