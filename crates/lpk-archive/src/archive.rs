//! LPK container access.
//!
//! The container is an ordinary ZIP file whose entries carry hashed names.
//! The archive is memory-mapped once and only ever read.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use lpk_common::hashed_name;
use memmap2::Mmap;
use tracing::trace;
use zip::ZipArchive;

use crate::crypto::{self, Keyring};
use crate::manifest::PackageManifest;
use crate::{Error, Result};

/// Logical name of the package manifest.
pub const MANIFEST_NAME: &str = "config.mlve";

/// Read-only LPK package.
///
/// Entries can be addressed either by their stored (hashed) name or by the
/// logical name the hash was computed from.
pub struct LpkArchive<R = Cursor<Mmap>> {
    /// Underlying ZIP container
    zip: ZipArchive<R>,
    /// Archive file name
    name: String,
}

impl LpkArchive {
    /// Open and memory-map an LPK file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::from_reader(Cursor::new(mmap), name)
    }
}

impl<R: Read + Seek> LpkArchive<R> {
    /// Wrap any seekable reader holding a ZIP container.
    pub fn from_reader(reader: R, name: impl Into<String>) -> Result<Self> {
        let zip = ZipArchive::new(reader)?;
        Ok(Self {
            zip,
            name: name.into(),
        })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.zip.len()
    }

    /// Find the index of the entry `name` is stored under.
    ///
    /// The name is tried verbatim first, then in its hashed form.
    pub fn resolve_index(&self, name: &str) -> Option<usize> {
        self.zip
            .index_for_name(name)
            .or_else(|| self.zip.index_for_name(&hashed_name(name)))
    }

    /// Read the raw (still encrypted) bytes of an entry.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .resolve_index(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;

        let mut file = self.zip.by_index(index)?;
        // the declared size is untrusted, let the buffer grow as data arrives
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        trace!(name, entry = file.name(), size = data.len(), "read entry");
        Ok(data)
    }

    /// Read an entry and decrypt it with the key derived for its reference.
    pub fn read_decrypted(&mut self, reference: &str, keyring: &Keyring) -> Result<Vec<u8>> {
        let key = keyring.derive(reference)?;
        let data = self.read(reference)?;
        Ok(crypto::decrypt(key, &data))
    }

    /// Load the package manifest.
    pub fn manifest(&mut self) -> Result<PackageManifest> {
        let data = self.read(MANIFEST_NAME)?;
        PackageManifest::from_slice(&data)
    }
}

impl<R: Read + Seek> std::fmt::Debug for LpkArchive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LpkArchive")
            .field("name", &self.name)
            .field("entries", &self.zip.len())
            .finish()
    }
}
