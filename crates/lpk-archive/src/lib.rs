//! LPK package reader.
//!
//! An LPK file is a ZIP container used to distribute Live2D character models.
//! This crate covers everything needed to get plaintext bytes out of it:
//!
//! - Entry lookup by logical or hashed name
//! - The `config.mlve` package manifest and the workshop `config.json` secrets
//! - Per-entry key derivation for both package schemes
//! - The LCG-based XOR stream cipher
//!
//! # Example
//!
//! ```no_run
//! use lpk_archive::{Keyring, LpkArchive};
//!
//! let mut archive = LpkArchive::open("model.lpk")?;
//! let manifest = archive.manifest()?;
//! let keyring = Keyring::new(&manifest, None)?;
//!
//! for character in &manifest.characters {
//!     for costume in &character.costumes {
//!         if let Some(reference) = costume.root_reference() {
//!             let data = archive.read_decrypted(reference, &keyring)?;
//!             println!("{reference}: {} bytes", data.len());
//!         }
//!     }
//! }
//! # Ok::<(), lpk_archive::Error>(())
//! ```

mod archive;
pub mod crypto;
mod error;
mod manifest;

pub use archive::{LpkArchive, MANIFEST_NAME};
pub use crypto::{ActiveSecrets, Key, Keyring};
pub use error::{Error, Result};
pub use manifest::{Character, Costume, PackageManifest, Scheme, WorkshopSecrets};
