//! Reference graph resolution and canonical layout for LPK packages.
//!
//! Model documents inside a package point at textures, motions and other
//! model documents through hashed entry names. This crate follows those
//! references, writes every asset into the standard Live2D directory layout
//! and rewrites the documents to point at the written files.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use lpk_extract::Extractor;
//!
//! let mut extractor = Extractor::open("model.lpk", None)?;
//! let report = extractor.extract(Path::new("output"))?;
//! println!("{} documents written", report.documents());
//! # Ok::<(), lpk_extract::Error>(())
//! ```

mod error;
mod extractor;
pub mod layout;
pub mod recovery;
pub mod sniff;
mod table;
pub mod token;
mod walker;

pub use error::{Error, Result};
pub use extractor::{CharacterReport, ExtractReport, Extractor};
pub use layout::{classify, Category, Placement};
pub use recovery::{LinePrompt, NoPrompt, Recovery, ScriptedPrompt, SecretProvider};
pub use sniff::sniff_extension;
pub use table::{DocumentSet, ReferenceTable, ResolutionState, ResolvedDocument};
pub use walker::Walker;
