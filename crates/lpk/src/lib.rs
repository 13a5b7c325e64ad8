//! LPK - Live2D model package unpacking library.
//!
//! This crate provides a unified interface to the LPK library ecosystem for
//! turning encrypted Live2D Viewer packages back into ordinary model folders.
//!
//! # Crates
//!
//! - [`lpk_common`] - Common utilities (entry name hashing, name sanitising)
//! - [`lpk_archive`] - Package reading (manifest, key derivation, cipher)
//! - [`lpk_extract`] - Reference graph resolution and output layout
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use lpk::prelude::*;
//!
//! let mut extractor = Extractor::open("model.lpk", Some(Path::new("config.json")))?;
//! extractor.verify_key()?;
//!
//! for index in 0..extractor.manifest().characters.len() {
//!     let report = extractor.extract_character(index, Path::new("output"))?;
//!     println!("{}: {} documents", report.name, report.documents);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use lpk_archive as archive;
pub use lpk_common as common;
pub use lpk_extract as extract;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use lpk_archive::{Keyring, LpkArchive, PackageManifest, Scheme, WorkshopSecrets};
    pub use lpk_common::{hashed_name, sanitize_dir_name};
    pub use lpk_extract::{
        CharacterReport, ExtractReport, Extractor, LinePrompt, NoPrompt, Recovery, SecretProvider,
    };
}

// Re-export commonly used types at the crate root
pub use lpk_extract::Extractor;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
