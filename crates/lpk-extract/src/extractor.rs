//! Package extraction.
//!
//! Drives the whole run: verifies the key once, walks every costume of every
//! character, then rewrites and writes the model documents collected for
//! each character.

use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use lpk_archive::{Keyring, LpkArchive, PackageManifest, WorkshopSecrets};
use lpk_common::sanitize_dir_name;
use memmap2::Mmap;
use tracing::{debug, info, warn};

use crate::layout;
use crate::recovery::{self, NoPrompt, Recovery, SecretProvider};
use crate::table::{ReferenceTable, ResolutionState};
use crate::walker::Walker;
use crate::{Error, Result};

/// Outcome of extracting one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterReport {
    /// Directory name used for the character.
    pub name: String,
    /// Full output directory.
    pub directory: PathBuf,
    /// Number of costume slots, including empty ones.
    pub costumes: usize,
    /// Indices of costumes whose graph could not be resolved.
    pub failed_costumes: Vec<usize>,
    /// Model documents written for this character.
    pub documents: usize,
}

/// Outcome of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub characters: Vec<CharacterReport>,
}

impl ExtractReport {
    /// Total documents written.
    pub fn documents(&self) -> usize {
        self.characters.iter().map(|c| c.documents).sum()
    }

    /// Total failed costumes.
    pub fn failed_costumes(&self) -> usize {
        self.characters.iter().map(|c| c.failed_costumes.len()).sum()
    }
}

/// Extracts an LPK package into the canonical Live2D layout.
pub struct Extractor<R = Cursor<Mmap>> {
    archive: LpkArchive<R>,
    manifest: PackageManifest,
    keyring: Keyring,
    title: Option<String>,
    candidates: Vec<String>,
    provider: Box<dyn SecretProvider>,
    recovery: Option<Recovery>,
    state: ResolutionState,
}

impl Extractor {
    /// Open a package file, with the workshop secrets file if it has one.
    pub fn open<P: AsRef<Path>>(archive_path: P, secrets_path: Option<&Path>) -> Result<Self> {
        let archive_path = archive_path.as_ref();
        let archive = LpkArchive::open(archive_path)?;
        let secrets = secrets_path.map(WorkshopSecrets::load).transpose()?;

        let mut extractor = Self::new(archive, secrets)?;
        for candidate in recovery::candidate_file_ids(None, Some(archive_path)) {
            extractor.add_file_id_candidate(candidate);
        }
        Ok(extractor)
    }
}

impl<R: Read + Seek> Extractor<R> {
    /// Create an extractor over an opened package.
    ///
    /// Fails if the manifest is unreadable, names an unknown scheme, or the
    /// package needs secrets that were not given.
    pub fn new(mut archive: LpkArchive<R>, secrets: Option<WorkshopSecrets>) -> Result<Self> {
        let manifest = archive.manifest()?;
        let keyring = Keyring::new(&manifest, secrets.as_ref())?;

        info!(
            archive = archive.name(),
            scheme = %manifest.scheme,
            id = %manifest.archive_id,
            characters = manifest.characters.len(),
            "loaded package manifest"
        );

        Ok(Self {
            candidates: recovery::candidate_file_ids(secrets.as_ref(), None),
            title: secrets.and_then(|s| s.title),
            archive,
            manifest,
            keyring,
            provider: Box::new(NoPrompt),
            recovery: None,
            state: ResolutionState::new(),
        })
    }

    /// Use `provider` when every automatic file id guess fails.
    pub fn with_secret_provider(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Add a file id to try during key recovery.
    pub fn add_file_id_candidate(&mut self, candidate: impl Into<String>) {
        let candidate = candidate.into();
        if self.keyring.file_id() != Some(candidate.as_str()) && !self.candidates.contains(&candidate) {
            self.candidates.push(candidate);
        }
    }

    /// Get the package manifest.
    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    /// Get the keyring, including any recovered file id.
    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    /// How the key was verified, once it has been.
    pub fn recovery(&self) -> Option<&Recovery> {
        self.recovery.as_ref()
    }

    /// Every reference resolved so far and where it went.
    pub fn references(&self) -> &ReferenceTable {
        &self.state.references
    }

    /// Entries decrypted while walking (key verification not included).
    pub fn decryptions(&self) -> usize {
        self.state.decryptions
    }

    /// Leaf assets written so far.
    pub fn assets(&self) -> usize {
        self.state.assets
    }

    /// Check, and if needed repair, the key against the first costume root.
    ///
    /// Runs once; later calls return the stored outcome.
    pub fn verify_key(&mut self) -> Result<&Recovery> {
        if self.recovery.is_none() {
            let outcome = match self.manifest.root_references().next().map(str::to_string) {
                Some(root) => recovery::recover_key(
                    &mut self.archive,
                    &mut self.keyring,
                    &root,
                    &self.candidates,
                    self.provider.as_mut(),
                )?,
                None => Recovery::NothingToVerify,
            };
            self.recovery = Some(outcome);
        }

        Ok(self.recovery.get_or_insert(Recovery::NothingToVerify))
    }

    /// Directory name for a character.
    ///
    /// A workshop title names the folder of single-character packages;
    /// otherwise the manifest name is used, then `character_<n>`.
    pub fn character_dir_name(&self, index: usize) -> String {
        let title = self
            .title
            .as_deref()
            .filter(|_| self.manifest.characters.len() == 1)
            .and_then(sanitize_dir_name);

        title
            .or_else(|| {
                self.manifest
                    .characters
                    .get(index)
                    .and_then(|c| c.display_name.as_deref())
                    .and_then(sanitize_dir_name)
            })
            .unwrap_or_else(|| format!("character_{}", index + 1))
    }

    /// Extract every character below `output`.
    ///
    /// Costume failures are logged and reported; a failure writing a
    /// character's documents stops the run.
    pub fn extract(&mut self, output: &Path) -> Result<ExtractReport> {
        fs::create_dir_all(output)?;
        self.verify_key()?;

        let mut report = ExtractReport::default();
        for index in 0..self.manifest.characters.len() {
            report.characters.push(self.extract_character(index, output)?);
        }
        Ok(report)
    }

    /// Extract one character into `output/<character>`.
    pub fn extract_character(&mut self, index: usize, output: &Path) -> Result<CharacterReport> {
        self.verify_key()?;

        let roots: Vec<Option<String>> = self
            .manifest
            .characters
            .get(index)
            .ok_or(Error::NoSuchCharacter(index))?
            .costumes
            .iter()
            .map(|c| c.root_reference().map(str::to_string))
            .collect();

        let name = self.character_dir_name(index);
        let directory = output.join(&name);
        fs::create_dir_all(&directory)?;

        info!(character = %name, costumes = roots.len(), "extracting character");

        let mut failed_costumes = Vec::new();
        for (costume, root) in roots.iter().enumerate() {
            let Some(root) = root else {
                debug!(character = %name, costume, "empty costume slot");
                continue;
            };

            let mut walker = Walker::new(&mut self.archive, &self.keyring, &mut self.state, &directory);
            if let Err(source) = walker.resolve(root) {
                let error = Error::CostumeExtraction {
                    index: costume,
                    source: Box::new(source),
                };
                warn!(character = %name, costume, "{error}");
                failed_costumes.push(costume);
            }
        }

        let documents = self.emit_documents(&directory)?;
        info!(character = %name, documents, "character extracted");

        Ok(CharacterReport {
            name,
            directory,
            costumes: roots.len(),
            failed_costumes,
            documents,
        })
    }

    /// Rewrite and write every pending document.
    fn emit_documents(&mut self, directory: &Path) -> Result<usize> {
        let documents = self.state.documents.drain();

        for document in &documents {
            let text = self.state.references.substitute(&document.json);
            let placement = layout::classify_file_name(&document.name);
            let path = placement.output_path(directory);

            let written = match path.parent() {
                Some(parent) => fs::create_dir_all(parent).and_then(|()| fs::write(&path, text.as_bytes())),
                None => fs::write(&path, text.as_bytes()),
            };
            written.map_err(|source| Error::DocumentEmission {
                name: document.name.clone(),
                source,
            })?;

            debug!(document = %placement.relative_path, "wrote model document");
        }

        Ok(documents.len())
    }
}

impl<R> std::fmt::Debug for Extractor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("manifest", &self.manifest)
            .field("recovery", &self.recovery)
            .field("references", &self.state.references.len())
            .finish()
    }
}
