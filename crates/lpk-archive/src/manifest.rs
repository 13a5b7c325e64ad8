//! Package manifest and workshop secrets.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::{Error, Result};

/// Key derivation scheme of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Steam Workshop package; keys also depend on external secrets.
    Workshop,
    /// Self-contained package.
    Standard,
}

impl Scheme {
    /// Manifest tag of the workshop scheme.
    pub const WORKSHOP_TAG: &'static str = "STM_1_0";
    /// Manifest tag of the standard scheme.
    pub const STANDARD_TAG: &'static str = "STD2_0";

    /// The manifest tag for this scheme.
    pub fn tag(self) -> &'static str {
        match self {
            Scheme::Workshop => Self::WORKSHOP_TAG,
            Scheme::Standard => Self::STANDARD_TAG,
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            Self::WORKSHOP_TAG => Ok(Scheme::Workshop),
            Self::STANDARD_TAG => Ok(Scheme::Standard),
            other => Err(Error::UnsupportedScheme(other.to_string())),
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The decoded `config.mlve` manifest.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    pub scheme: Scheme,
    pub archive_id: String,
    pub encrypted: bool,
    pub characters: Vec<Character>,
}

/// One character of the package.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Character {
    #[serde(rename = "character", default)]
    pub display_name: Option<String>,
    #[serde(rename = "costume", default)]
    pub costumes: Vec<Costume>,
}

/// One model variant of a character.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Costume {
    #[serde(rename = "path", default)]
    pub path: Option<String>,
}

impl Costume {
    /// The root model reference, or `None` for an empty slot.
    pub fn root_reference(&self) -> Option<&str> {
        self.path.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: String,
    #[serde(default = "encrypted_by_default", deserialize_with = "flag")]
    encrypt: bool,
    #[serde(default)]
    list: Vec<Character>,
}

fn encrypted_by_default() -> bool {
    true
}

/// `encrypt` is usually the string `"true"`/`"false"`, but accept real booleans.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.trim().eq_ignore_ascii_case("true"),
    })
}

impl PackageManifest {
    /// Parse a manifest from its JSON bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::InvalidManifest(format!("not UTF-8: {e}")))?;
        let raw: RawManifest = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;

        Ok(Self {
            scheme: raw.kind.parse()?,
            archive_id: raw.id,
            encrypted: raw.encrypt,
            characters: raw.list,
        })
    }

    /// Iterate over every non-empty costume root, in manifest order.
    pub fn root_references(&self) -> impl Iterator<Item = &str> + '_ {
        self.characters
            .iter()
            .flat_map(|c| c.costumes.iter())
            .filter_map(Costume::root_reference)
    }
}

/// Contents of a workshop `config.json`.
///
/// This is the on-disk record and is never modified or written back.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopSecrets {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub meta_data: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lpk_file: Option<String>,
}

impl WorkshopSecrets {
    /// Load secrets from a `config.json` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_str(&text)
    }
}

impl FromStr for WorkshopSecrets {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text.trim_start_matches('\u{feff}'))?)
    }
}
