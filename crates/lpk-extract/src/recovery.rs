//! Workshop key recovery.
//!
//! Workshop packages are often shared with a `config.json` whose `fileId` has
//! been erased or is wrong. The only way to tell is to decrypt the root model
//! and see whether the result is text. When it is not, a few guesses are
//! tried before asking the operator.

use std::collections::VecDeque;
use std::io::{BufRead, Read, Seek, Write};
use std::path::Path;

use lpk_archive::{Keyring, LpkArchive, WorkshopSecrets};
use tracing::{info, warn};

use crate::{Error, Result};

/// Where workshop content usually lives, shown when asking for the id.
pub const FILE_ID_HINT: &str = "the workshop file id is usually the name of a folder under \
     <steam>/steamapps/workshop/content/616720/";

/// Source of a file id when all automatic guesses failed.
///
/// The CLI reads a line from the terminal; tests use [`ScriptedPrompt`].
pub trait SecretProvider {
    /// Ask for a file id. `None` means no answer is available.
    fn provide_file_id(&mut self, reference: &str) -> Option<String>;
}

/// Provider that never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl SecretProvider for NoPrompt {
    fn provide_file_id(&mut self, _reference: &str) -> Option<String> {
        None
    }
}

/// Blocking line-based prompt.
pub struct LinePrompt<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> LinePrompt<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }
}

impl<I: BufRead, O: Write> SecretProvider for LinePrompt<I, O> {
    fn provide_file_id(&mut self, _reference: &str) -> Option<String> {
        writeln!(self.output, "{FILE_ID_HINT}").ok()?;
        write!(self.output, "automatic fix failed, please enter the file id: ").ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        self.input.read_line(&mut line).ok()?;
        let answer = line.trim();
        (!answer.is_empty()).then(|| answer.to_string())
    }
}

/// Provider replaying canned answers.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    requests: usize,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            requests: 0,
        }
    }

    /// How many times an answer was requested.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

impl SecretProvider for ScriptedPrompt {
    fn provide_file_id(&mut self, _reference: &str) -> Option<String> {
        self.requests += 1;
        self.answers.pop_front()
    }
}

/// How a working key was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// The configured secrets worked as-is.
    Accepted,
    /// An automatic guess worked.
    Candidate(String),
    /// The operator-provided id worked.
    Operator(String),
    /// The package has no model to verify against.
    NothingToVerify,
}

/// File ids worth trying when the configured one fails, most likely first.
pub fn candidate_file_ids(secrets: Option<&WorkshopSecrets>, archive_path: Option<&Path>) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(lpk_file) = secrets.and_then(|s| s.lpk_file.as_deref()) {
        let name = Path::new(lpk_file.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let stem = name.strip_suffix(".lpk").unwrap_or(name);
        candidates.push(stem.to_string());
    }

    if let Some(path) = archive_path {
        let folder = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());
        let stem = path.file_stem().and_then(|n| n.to_str());
        candidates.extend(folder.into_iter().chain(stem).filter(|s| is_numeric(s)).map(String::from));
    }

    let current = secrets.map(|s| s.file_id.as_str());
    let mut unique: Vec<String> = Vec::new();
    for candidate in candidates {
        if !candidate.is_empty() && Some(candidate.as_str()) != current && !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Make sure `keyring` decrypts `reference` to text, fixing its file id if
/// needed.
///
/// On success the keyring keeps the working file id. Fails with
/// [`Error::KeyRecoveryExhausted`] once the configured id, every candidate and
/// one operator answer have been tried.
pub fn recover_key<R: Read + Seek>(
    archive: &mut LpkArchive<R>,
    keyring: &mut Keyring,
    reference: &str,
    candidates: &[String],
    provider: &mut dyn SecretProvider,
) -> Result<Recovery> {
    info!(reference, "checking decryption of root model");

    if decodes(archive, keyring, reference)? {
        return Ok(Recovery::Accepted);
    }

    if !keyring.uses_secrets() {
        return Err(Error::KeyRecoveryExhausted {
            reference: reference.to_string(),
        });
    }

    info!("configured file id does not decrypt, trying to fix it");
    for candidate in candidates {
        keyring.set_file_id(candidate.as_str());
        if decodes(archive, keyring, reference)? {
            info!(file_id = %candidate, "recovered file id");
            return Ok(Recovery::Candidate(candidate.clone()));
        }
    }

    warn!("automatic file id recovery failed");
    if let Some(answer) = provider.provide_file_id(reference) {
        keyring.set_file_id(answer.as_str());
        if decodes(archive, keyring, reference)? {
            info!(file_id = %answer, "operator file id accepted");
            return Ok(Recovery::Operator(answer));
        }
    }

    Err(Error::KeyRecoveryExhausted {
        reference: reference.to_string(),
    })
}

fn decodes<R: Read + Seek>(archive: &mut LpkArchive<R>, keyring: &Keyring, reference: &str) -> Result<bool> {
    let data = archive.read_decrypted(reference, keyring)?;
    Ok(std::str::from_utf8(&data).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn secrets(file_id: &str, lpk_file: Option<&str>) -> WorkshopSecrets {
        WorkshopSecrets {
            file_id: file_id.to_string(),
            meta_data: "meta".to_string(),
            title: None,
            lpk_file: lpk_file.map(String::from),
        }
    }

    #[test]
    fn test_candidates_from_lpk_file() {
        let s = secrets("", Some("2843210000.lpk"));
        assert_eq!(candidate_file_ids(Some(&s), None), vec!["2843210000"]);
    }

    #[test]
    fn test_candidates_from_workshop_folder() {
        let path = PathBuf::from("content").join("616720").join("2843210000").join("model.lpk");
        let s = secrets("wrong", Some("2843210000.lpk"));
        assert_eq!(candidate_file_ids(Some(&s), Some(&path)), vec!["2843210000"]);
    }

    #[test]
    fn test_candidates_skip_current_id() {
        let s = secrets("123", Some("123.lpk"));
        let path = PathBuf::from("456.lpk");
        assert_eq!(candidate_file_ids(Some(&s), Some(&path)), vec!["456"]);
    }

    #[test]
    fn test_no_candidates() {
        assert!(candidate_file_ids(None, Some(Path::new("model.lpk"))).is_empty());
    }

    #[test]
    fn test_line_prompt() {
        let mut out = Vec::new();
        let mut prompt = LinePrompt::new(Cursor::new(b"  987654\n".to_vec()), &mut out);
        assert_eq!(prompt.provide_file_id("x.bin").as_deref(), Some("987654"));
        assert!(String::from_utf8(out).unwrap().contains("616720"));
    }

    #[test]
    fn test_line_prompt_empty_answer() {
        let mut prompt = LinePrompt::new(Cursor::new(b"\n".to_vec()), Vec::new());
        assert_eq!(prompt.provide_file_id("x.bin"), None);
    }

    #[test]
    fn test_scripted_prompt() {
        let mut prompt = ScriptedPrompt::new(["1"]);
        assert_eq!(prompt.provide_file_id("x.bin").as_deref(), Some("1"));
        assert_eq!(prompt.provide_file_id("x.bin"), None);
        assert_eq!(prompt.requests(), 2);
    }
}
