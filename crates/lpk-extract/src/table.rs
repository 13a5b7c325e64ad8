//! Resolution state shared across a whole extraction run.
//!
//! [`ResolutionState`] is created once per run and never cleared. Its
//! [`ReferenceTable`] doubles as the memo that stops a reference from being
//! decrypted twice and as the dictionary used to rewrite documents.

use rustc_hash::{FxHashMap, FxHashSet};

/// Mapping from original reference to the path it was written to.
///
/// Entries are append-only: the first mapping recorded for a reference wins.
/// Paths are tracked too, so callers can keep the mapping injective.
#[derive(Debug, Default, Clone)]
pub struct ReferenceTable {
    entries: Vec<(String, String)>,
    index: FxHashMap<String, usize>,
    /// Lowercased paths in use; case-insensitive filesystems would merge them.
    paths: FxHashSet<String>,
}

impl ReferenceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping. Returns `false` (and changes nothing) if the
    /// reference is already known.
    pub fn insert(&mut self, reference: impl Into<String>, path: impl Into<String>) -> bool {
        let reference = reference.into();
        if self.index.contains_key(&reference) {
            return false;
        }

        let path = path.into();
        self.paths.insert(path.to_lowercase());
        self.index.insert(reference.clone(), self.entries.len());
        self.entries.push((reference, path));
        true
    }

    /// Check whether some reference already resolved to `path`, ignoring case.
    pub fn is_path_taken(&self, path: &str) -> bool {
        self.paths.contains(&path.to_lowercase())
    }

    /// Check whether a reference has been resolved.
    #[inline]
    pub fn contains(&self, reference: &str) -> bool {
        self.index.contains_key(reference)
    }

    /// Get the path a reference resolved to.
    pub fn get(&self, reference: &str) -> Option<&str> {
        self.index
            .get(reference)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Number of resolved references.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been resolved yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over mappings in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(r, p)| (r.as_str(), p.as_str()))
    }

    /// Replace every known reference in `text` with its path.
    ///
    /// Longer references are replaced first so one reference that is a prefix
    /// of another (`x.bin` / `x.bin3`) cannot clobber it.
    pub fn substitute(&self, text: &str) -> String {
        let mut ordered: Vec<&(String, String)> = self.entries.iter().collect();
        ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        ordered
            .into_iter()
            .fold(text.to_string(), |out, (reference, path)| {
                if out.contains(reference.as_str()) {
                    out.replace(reference.as_str(), path)
                } else {
                    out
                }
            })
    }
}

/// A decoded model document waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    /// Run-wide sequential id.
    pub id: usize,
    /// Synthetic file name, `model<id>.model3.json`.
    pub name: String,
    /// Serialized document, references not yet rewritten.
    pub json: String,
}

/// Documents resolved since the last flush.
#[derive(Debug, Default, Clone)]
pub struct DocumentSet {
    pending: Vec<ResolvedDocument>,
    resolved: usize,
}

impl DocumentSet {
    /// Id the next document will get.
    #[inline]
    pub fn next_id(&self) -> usize {
        self.resolved
    }

    /// Queue a document. Its id must be [`next_id`](Self::next_id).
    pub fn push(&mut self, document: ResolvedDocument) {
        debug_assert_eq!(document.id, self.resolved);
        self.resolved += 1;
        self.pending.push(document);
    }

    /// Total documents resolved during the run.
    #[inline]
    pub fn resolved(&self) -> usize {
        self.resolved
    }

    /// Take all pending documents, keeping the id counter.
    pub fn drain(&mut self) -> Vec<ResolvedDocument> {
        std::mem::take(&mut self.pending)
    }
}

/// Run-wide resolution state.
#[derive(Debug, Default)]
pub struct ResolutionState {
    pub references: ReferenceTable,
    pub documents: DocumentSet,
    /// Number of entries decrypted while walking.
    pub decryptions: usize,
    /// Number of leaf assets written.
    pub assets: usize,
}

impl ResolutionState {
    /// Create fresh state for a run.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_mapping_wins() {
        let mut table = ReferenceTable::new();
        assert!(table.insert("a.bin", "textures/a.png"));
        assert!(!table.insert("a.bin", "other.png"));
        assert_eq!(table.get("a.bin"), Some("textures/a.png"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_paths_are_tracked() {
        let mut table = ReferenceTable::new();
        table.insert("a.bin", "textures/Tex_0.png");
        assert!(table.is_path_taken("textures/Tex_0.png"));
        assert!(table.is_path_taken("Textures/tex_0.PNG"));
        assert!(!table.is_path_taken("textures/Tex_1.png"));

        // a rejected insert does not claim its path
        table.insert("a.bin", "other.png");
        assert!(!table.is_path_taken("other.png"));
    }

    #[test]
    fn test_substitute_all_occurrences() {
        let mut table = ReferenceTable::new();
        table.insert("a.bin", "textures/a.png");
        table.insert("m.bin", "model1.model3.json");

        let text = r#"{"T":["a.bin","a.bin"],"C":"change_cos m.bin"}"#;
        assert_eq!(
            table.substitute(text),
            r#"{"T":["textures/a.png","textures/a.png"],"C":"change_cos model1.model3.json"}"#
        );
    }

    #[test]
    fn test_substitute_longest_first() {
        let mut table = ReferenceTable::new();
        table.insert("x.bin", "short.png");
        table.insert("x.bin3", "long.json");

        assert_eq!(table.substitute("x.bin3 x.bin"), "long.json short.png");
    }

    #[test]
    fn test_document_ids_survive_drain() {
        let mut docs = DocumentSet::default();
        for _ in 0..2 {
            let id = docs.next_id();
            docs.push(ResolvedDocument {
                id,
                name: format!("model{id}.model3.json"),
                json: "{}".to_string(),
            });
        }

        let drained = docs.drain();
        assert_eq!(drained.len(), 2);
        assert!(docs.drain().is_empty());
        assert_eq!(docs.next_id(), 2);
        assert_eq!(docs.resolved(), 2);
    }
}
