//! LPK key derivation and stream cipher.
//!
//! Every entry is encrypted with its own key. The key is a 32-bit seed hashed
//! from a scheme-dependent material string that always includes the entry's
//! reference name. The seed drives a linear congruential generator whose
//! output is XORed into the data, restarting every [`BLOCK_SIZE`] bytes.

use crate::manifest::{PackageManifest, Scheme, WorkshopSecrets};
use crate::{Error, Result};

/// Keystream restart interval in bytes.
pub const BLOCK_SIZE: usize = 1024;

const LCG_MULTIPLIER: u32 = 214_013;
const LCG_INCREMENT: u32 = 2_531_011;

/// A per-entry decryption key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Data is stored in plaintext.
    Identity,
    /// Data is XORed with the keystream seeded by this value.
    Stream(u32),
}

impl Key {
    /// Hash a key material string into a stream key.
    pub fn from_material(material: &str) -> Self {
        Key::Stream(seed(material))
    }
}

/// 32-bit rolling hash over the Unicode scalar values of `material`.
pub fn seed(material: &str) -> u32 {
    material
        .chars()
        .fold(0u32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as u32))
}

/// Apply the keystream to `data`.
///
/// The transform is an involution, so this both encrypts and decrypts. A
/// wrong key never fails here; it just produces garbage.
pub fn decrypt(key: Key, data: &[u8]) -> Vec<u8> {
    let seed = match key {
        Key::Identity => return data.to_vec(),
        Key::Stream(seed) => seed,
    };

    let mut out = Vec::with_capacity(data.len());
    for block in data.chunks(BLOCK_SIZE) {
        let mut state = seed;
        out.extend(block.iter().map(|&byte| {
            state = (state.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT) >> 16) & 0xFFFF;
            byte ^ (state & 0xFF) as u8
        }));
    }
    out
}

/// Encrypt `data`. Identical to [`decrypt`].
#[inline]
pub fn encrypt(key: Key, data: &[u8]) -> Vec<u8> {
    decrypt(key, data)
}

/// Derive the key for one reference.
///
/// This is a pure function of its inputs. `secrets` is only consulted for
/// encrypted workshop packages, which fail with [`Error::MissingSecrets`]
/// without it.
pub fn derive_key(
    scheme: Scheme,
    archive_id: &str,
    encrypted: bool,
    reference: &str,
    secrets: Option<&ActiveSecrets>,
) -> Result<Key> {
    match scheme {
        Scheme::Workshop if !encrypted => Ok(Key::Identity),
        Scheme::Workshop => {
            let secrets = secrets.ok_or(Error::MissingSecrets)?;
            Ok(Key::from_material(&format!(
                "{archive_id}{}{reference}{}",
                secrets.file_id, secrets.meta_data
            )))
        }
        Scheme::Standard => Ok(Key::from_material(&format!("{archive_id}{reference}"))),
    }
}

/// The secret values actually used for derivation.
///
/// Starts as a copy of the loaded [`WorkshopSecrets`] and may have its file id
/// replaced during key recovery. Changes never reach the secrets file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSecrets {
    pub file_id: String,
    pub meta_data: String,
}

impl From<&WorkshopSecrets> for ActiveSecrets {
    fn from(secrets: &WorkshopSecrets) -> Self {
        Self {
            file_id: secrets.file_id.clone(),
            meta_data: secrets.meta_data.clone(),
        }
    }
}

/// Everything needed to derive keys for one package.
#[derive(Debug, Clone)]
pub struct Keyring {
    scheme: Scheme,
    archive_id: String,
    encrypted: bool,
    secrets: Option<ActiveSecrets>,
}

impl Keyring {
    /// Build the keyring for a package.
    ///
    /// Fails up front with [`Error::MissingSecrets`] for encrypted workshop
    /// packages opened without secrets.
    pub fn new(manifest: &PackageManifest, secrets: Option<&WorkshopSecrets>) -> Result<Self> {
        let keyring = Self {
            scheme: manifest.scheme,
            archive_id: manifest.archive_id.clone(),
            encrypted: manifest.encrypted,
            secrets: secrets.map(ActiveSecrets::from),
        };

        if keyring.uses_secrets() && keyring.secrets.is_none() {
            return Err(Error::MissingSecrets);
        }

        Ok(keyring)
    }

    /// Derive the key for a reference.
    pub fn derive(&self, reference: &str) -> Result<Key> {
        derive_key(
            self.scheme,
            &self.archive_id,
            self.encrypted,
            reference,
            self.secrets.as_ref(),
        )
    }

    /// Whether derived keys depend on the workshop secrets.
    #[inline]
    pub fn uses_secrets(&self) -> bool {
        self.scheme == Scheme::Workshop && self.encrypted
    }

    /// The file id currently used for derivation.
    pub fn file_id(&self) -> Option<&str> {
        self.secrets.as_ref().map(|s| s.file_id.as_str())
    }

    /// Replace the file id used for derivation.
    ///
    /// Does nothing when the keyring holds no secrets.
    pub fn set_file_id(&mut self, file_id: impl Into<String>) {
        if let Some(secrets) = self.secrets.as_mut() {
            secrets.file_id = file_id.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets(file_id: &str) -> ActiveSecrets {
        ActiveSecrets {
            file_id: file_id.to_string(),
            meta_data: "meta".to_string(),
        }
    }

    #[test]
    fn test_seed_rolling_hash() {
        assert_eq!(seed(""), 0);
        assert_eq!(seed("a"), 97);
        assert_eq!(seed("ab"), 97 * 31 + 98);
        // wraps instead of overflowing
        let long = "z".repeat(64);
        assert_eq!(seed(&long), seed(&long));
    }

    #[test]
    fn test_known_keystream() {
        assert_eq!(decrypt(Key::Stream(0), &[0, 0]), vec![38, 162]);
    }

    #[test]
    fn test_keystream_restarts_every_block() {
        let out = decrypt(Key::Stream(0xDEAD_BEEF), &[0u8; BLOCK_SIZE * 2 + 10]);
        assert_eq!(out[..BLOCK_SIZE], out[BLOCK_SIZE..BLOCK_SIZE * 2]);
        assert_eq!(out[..10], out[BLOCK_SIZE * 2..]);
    }

    #[test]
    fn test_identity_key_passthrough() {
        assert_eq!(decrypt(Key::Identity, b"plain"), b"plain");
    }

    #[test]
    fn test_cipher_is_involution() {
        let key = Key::from_material("abcmodel.bin");
        let plain = br#"{"Version":3}"#;
        let cipher = encrypt(key, plain);
        assert_ne!(cipher.as_slice(), plain.as_slice());
        assert_eq!(decrypt(key, &cipher), plain);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let s = secrets("123");
        let a = derive_key(Scheme::Workshop, "id", true, "x.bin", Some(&s)).unwrap();
        let b = derive_key(Scheme::Workshop, "id", true, "x.bin", Some(&s)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Key::from_material("id123x.binmeta"));
    }

    #[test]
    fn test_standard_scheme_ignores_secrets() {
        let key = derive_key(Scheme::Standard, "abc", true, "x.bin", None).unwrap();
        assert_eq!(key, Key::from_material("abcx.bin"));
    }

    #[test]
    fn test_unencrypted_workshop_is_identity() {
        let key = derive_key(Scheme::Workshop, "abc", false, "x.bin", None).unwrap();
        assert_eq!(key, Key::Identity);
    }

    #[test]
    fn test_workshop_without_secrets() {
        let result = derive_key(Scheme::Workshop, "abc", true, "x.bin", None);
        assert!(matches!(result, Err(Error::MissingSecrets)));
    }
}
