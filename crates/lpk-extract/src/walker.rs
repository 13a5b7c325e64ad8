//! Reference graph walker.
//!
//! Starting from a costume's root reference, the walker decrypts model
//! documents, follows costume switches into further model documents and
//! recovers every leaf asset they mention.
//!
//! Each reference is entered into the [`ReferenceTable`](crate::ReferenceTable)
//! before its document is scanned, so a reference is decrypted at most once
//! per run and cyclic costume switches terminate.

use std::fs;
use std::io::{Read, Seek};
use std::path::Path;

use lpk_archive::{Keyring, LpkArchive};
use lpk_common::sanitize_file_stem;
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::layout::{self, Placement, MODEL_DESCRIPTOR_SUFFIX};
use crate::sniff;
use crate::table::{ResolutionState, ResolvedDocument};
use crate::token;
use crate::{Error, Result};

/// Walks the reference graph of one costume.
///
/// The walker borrows the run-wide [`ResolutionState`]; everything it learns
/// outlives it.
pub struct Walker<'a, R> {
    archive: &'a mut LpkArchive<R>,
    keyring: &'a Keyring,
    state: &'a mut ResolutionState,
    output_dir: &'a Path,
}

impl<'a, R: Read + Seek> Walker<'a, R> {
    /// Create a walker writing leaf assets below `output_dir`.
    pub fn new(
        archive: &'a mut LpkArchive<R>,
        keyring: &'a Keyring,
        state: &'a mut ResolutionState,
        output_dir: &'a Path,
    ) -> Self {
        Self {
            archive,
            keyring,
            state,
            output_dir,
        }
    }

    /// Resolve a model document and everything reachable from it.
    pub fn resolve(&mut self, reference: &str) -> Result<()> {
        if self.state.references.contains(reference) {
            trace!(reference, "model already resolved");
            return Ok(());
        }

        debug!(reference, "resolving model document");

        let plaintext = self.decrypt(reference)?;
        let document = parse_document(reference, &plaintext)?;

        let id = self.state.documents.next_id();
        let name = format!("model{id}{MODEL_DESCRIPTOR_SUFFIX}");
        self.state.references.insert(reference, name.as_str());
        self.state.documents.push(ResolvedDocument {
            id,
            name,
            json: serde_json::to_string_pretty(&document)?,
        });

        for field in token::flatten(&document) {
            let Some(text) = field.text() else {
                continue;
            };

            if field.is_command() {
                if !text.is_empty() {
                    self.resolve_commands(&field.name, text, id)?;
                }
            } else if token::is_reference(text) {
                let stem = asset_stem(&field.name, id, 0);
                self.resolve_asset(text, &stem)?;
            }
        }

        debug!(reference, id, "finished model document");
        Ok(())
    }

    /// Handle every `;`-separated command of a command field.
    fn resolve_commands(&mut self, field: &str, commands: &str, id: usize) -> Result<()> {
        for (position, command) in commands.split(';').enumerate() {
            let Some(reference) = token::find_reference(command) else {
                continue;
            };

            if token::is_costume_switch(command) {
                self.resolve(reference)?;
            } else {
                let stem = asset_stem(field, id, position);
                self.resolve_asset(reference, &stem)?;
            }
        }
        Ok(())
    }

    /// Decrypt, classify and write one leaf asset.
    fn resolve_asset(&mut self, reference: &str, stem: &str) -> Result<()> {
        if self.state.references.contains(reference) {
            trace!(reference, "asset already resolved");
            return Ok(());
        }

        let data = self.decrypt(reference)?;
        let extension = sniff::sniff_extension(&data);
        let placement = self.unique_placement(stem, extension);

        let path = placement.output_path(self.output_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &data)?;

        info!(reference, path = %placement.relative_path, "recovered asset");

        self.state.assets += 1;
        self.state.references.insert(reference, placement.relative_path);
        Ok(())
    }

    /// Classify `stem`, appending `_<k>` until the path is not yet in use.
    fn unique_placement(&self, stem: &str, extension: &str) -> Placement {
        let mut placement = layout::classify(stem, extension);
        let mut attempt = 1;
        while self.state.references.is_path_taken(&placement.relative_path) {
            placement = layout::classify(&format!("{stem}_{attempt}"), extension);
            attempt += 1;
        }
        placement
    }

    fn decrypt(&mut self, reference: &str) -> Result<Vec<u8>> {
        self.state.decryptions += 1;
        Ok(self.archive.read_decrypted(reference, self.keyring)?)
    }
}

/// File stem for a leaf asset found in `field` of document `id`.
///
/// Later sub-commands of the same field get their position appended so they
/// do not overwrite each other.
fn asset_stem(field: &str, id: usize, position: usize) -> String {
    let stem = if position == 0 {
        format!("{field}_{id}")
    } else {
        format!("{field}_{id}_{position}")
    };
    sanitize_file_stem(&stem)
}

/// Decode a model document, tolerating a UTF-8 BOM.
pub(crate) fn parse_document(reference: &str, data: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(data).map_err(|e| Error::InvalidDocument {
        reference: reference.to_string(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(text.trim_start_matches('\u{feff}')).map_err(|e| Error::InvalidDocument {
        reference: reference.to_string(),
        reason: e.to_string(),
    })
}
