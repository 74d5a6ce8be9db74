//! The ordered set of language documents and its key reconciliation.

use indexmap::IndexSet;
use serde::{
    Deserialize,
    Serialize,
};

use super::ParsedDocument;
use crate::flatten::{
    FlatMap,
    flatten,
};
use crate::value::Leaf;

/// One language file, keyed by flat paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredDocument")]
pub struct Document {
    name: String,
    data: FlatMap,
    /// Keys present in the file when it was uploaded, before backfill.
    contributed: IndexSet<String>,
}

/// Persisted form of a [`Document`]; `contributed` is optional for older snapshots.
#[derive(Deserialize)]
struct StoredDocument {
    name: String,
    data: FlatMap,
    #[serde(default)]
    contributed: Option<IndexSet<String>>,
}

impl From<StoredDocument> for Document {
    fn from(stored: StoredDocument) -> Self {
        let contributed =
            stored.contributed.unwrap_or_else(|| stored.data.keys().cloned().collect());
        Self { name: stored.name, data: stored.data, contributed }
    }
}

impl Document {
    /// Creates a document whose every key counts as contributed.
    #[must_use]
    pub fn new(name: impl Into<String>, data: FlatMap) -> Self {
        let contributed = data.keys().cloned().collect();
        Self { name: name.into(), data, contributed }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn data(&self) -> &FlatMap {
        &self.data
    }

    #[must_use]
    pub const fn contributed(&self) -> &IndexSet<String> {
        &self.contributed
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Leaf> {
        self.data.get(key)
    }
}

/// The persisted unit of editor state.
pub type Snapshot = Vec<Document>;

/// Outcome of applying one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    /// Names appended to the set, in batch order.
    pub added: Vec<String>,
    /// Names whose data was replaced wholesale.
    pub replaced: Vec<String>,
    /// Number of `(document, key)` pairs filled with an empty value.
    pub backfilled: usize,
}

/// Ordered collection of documents sharing one key set.
///
/// After every upload each document holds every key seen in any document;
/// keys a document did not bring itself are filled with an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSet {
    documents: Vec<Document>,
    key_separator: String,
}

impl Default for DocumentSet {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DocumentSet {
    /// Creates an empty set splitting nested keys with `key_separator`.
    #[must_use]
    pub fn new(key_separator: impl Into<String>) -> Self {
        Self { documents: Vec::new(), key_separator: key_separator.into() }
    }

    /// Restores a set from a persisted snapshot, as-is.
    #[must_use]
    pub fn from_snapshot(key_separator: impl Into<String>, snapshot: Snapshot) -> Self {
        Self { documents: snapshot, key_separator: key_separator.into() }
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.documents.clone()
    }

    #[must_use]
    pub fn key_separator(&self) -> &str {
        &self.key_separator
    }

    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|document| document.name == name)
    }

    #[must_use]
    pub fn value(&self, name: &str, key: &str) -> Option<&Leaf> {
        self.get(name).and_then(|document| document.value(key))
    }

    /// Document names in set order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(Document::name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Every key of every document, in first-encounter order.
    #[must_use]
    pub fn key_union(&self) -> IndexSet<String> {
        self.documents.iter().flat_map(|document| document.data.keys().cloned()).collect()
    }

    /// Uploads a single document. See [`DocumentSet::upload_batch`].
    pub fn upload(&mut self, name: impl Into<String>, root: &crate::value::Node) -> UploadSummary {
        self.upload_batch(vec![ParsedDocument::new(name, root.clone())])
    }

    /// Applies a batch of parsed documents, then reconciles keys once.
    ///
    /// A document whose name is already present replaces the old data
    /// entirely; otherwise it is appended.
    pub fn upload_batch(&mut self, batch: Vec<ParsedDocument>) -> UploadSummary {
        let mut summary = UploadSummary::default();

        for parsed in batch {
            let document = Document::new(parsed.name, flatten(&parsed.root, &self.key_separator));
            if let Some(existing) =
                self.documents.iter_mut().find(|existing| existing.name == document.name)
            {
                tracing::debug!(name = %document.name, keys = document.data.len(), "Replacing document");
                summary.replaced.push(document.name.clone());
                *existing = document;
            } else {
                tracing::debug!(name = %document.name, keys = document.data.len(), "Adding document");
                summary.added.push(document.name.clone());
                self.documents.push(document);
            }
        }

        summary.backfilled = self.reconcile();
        summary
    }

    /// Sets `key` to a text value in the named document.
    ///
    /// Returns `false` (and changes nothing) when no document has that name.
    /// A key no document had before is added to this document as contributed
    /// and backfilled everywhere else, so the shared key set holds.
    pub fn update(&mut self, name: &str, key: &str, value: impl Into<String>) -> bool {
        let Some(document) = self.documents.iter_mut().find(|document| document.name == name)
        else {
            tracing::warn!(name, key, "Ignoring edit for unknown document");
            return false;
        };

        let is_new_key = !document.data.contains_key(key);
        document.data.insert(key.to_string(), Leaf::text(value));
        if is_new_key {
            document.contributed.insert(key.to_string());
            self.reconcile();
        }
        true
    }

    /// Removes every document.
    pub fn reset(&mut self) {
        tracing::debug!(documents = self.documents.len(), "Resetting document set");
        self.documents.clear();
    }

    /// Backfills missing keys with empty values; returns how many were added.
    fn reconcile(&mut self) -> usize {
        let all_keys = self.key_union();
        let mut backfilled = 0;

        for document in &mut self.documents {
            for key in &all_keys {
                if !document.data.contains_key(key) {
                    document.data.insert(key.clone(), Leaf::empty());
                    backfilled += 1;
                }
            }
        }

        if backfilled > 0 {
            tracing::debug!(keys = all_keys.len(), backfilled, "Reconciled document keys");
        }
        backfilled
    }
}
