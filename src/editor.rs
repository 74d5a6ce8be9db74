//! The editing session driven by a presentation layer.
//!
//! `Editor` owns the document set and its derived views. Every successful
//! mutation is written to the configured [`StateStore`] before returning.

use std::sync::Arc;

use salsa::Setter;
use serde::Serialize;
use thiserror::Error;

use crate::config::{
    EditorSettings,
    UploadFailurePolicy,
};
use crate::db::EditorDatabaseImpl;
use crate::document::{
    Document,
    DocumentSet,
    ParsedDocument,
    UploadError,
    UploadSource,
    UploadSummary,
    load_batch,
};
use crate::export::{
    ExportBatch,
    export_all,
};
use crate::labels::{
    KeyContributions,
    LabelEntry,
    LabelIndex,
    contributions_of,
    label_index,
};
use crate::lookup::LookupCache;
use crate::store::{
    MemoryStateStore,
    StateStore,
    StoreError,
};

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Upload aborted, {} file(s) failed to load", failures.len())]
    UploadAborted { failures: Vec<UploadError> },

    #[error("Document '{0}' does not exist")]
    UnknownDocument(String),
}

/// Whether any document is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorState {
    Empty,
    Populated,
}

/// Result of an upload: what changed plus the files that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    #[serde(flatten)]
    pub summary: UploadSummary,
    pub errors: Vec<String>,
}

pub struct Editor {
    db: EditorDatabaseImpl,
    contributions: KeyContributions,
    documents: DocumentSet,
    lookup: LookupCache,
    store: Arc<dyn StateStore>,
    settings: EditorSettings,
    default_document: Option<String>,
    /// Times the label index input was replaced.
    #[cfg(test)]
    label_refreshes: u64,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("documents", &self.documents.len())
            .field("store", &self.store)
            .field("default_document", &self.default_document)
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Opens a session, restoring whatever `store` holds.
    ///
    /// # Errors
    /// Returns error if the stored state cannot be read.
    pub fn open(store: Arc<dyn StateStore>, settings: EditorSettings) -> Result<Self, EditorError> {
        let snapshot = store.load()?.unwrap_or_default();
        tracing::debug!(documents = snapshot.len(), "Restoring editor state");
        Ok(Self::with_snapshot(store, settings, snapshot))
    }

    /// An empty session that persists nowhere but memory.
    #[must_use]
    pub fn in_memory(settings: EditorSettings) -> Self {
        Self::with_snapshot(Arc::new(MemoryStateStore::new()), settings, Vec::new())
    }

    fn with_snapshot(
        store: Arc<dyn StateStore>,
        settings: EditorSettings,
        snapshot: Vec<Document>,
    ) -> Self {
        let documents = DocumentSet::from_snapshot(settings.key_separator.clone(), snapshot);
        let db = EditorDatabaseImpl::default();
        let contributions = KeyContributions::new(&db, contributions_of(&documents));
        let default_document = documents.names().next().map(str::to_string);

        Self {
            db,
            contributions,
            documents,
            lookup: LookupCache::new(),
            store,
            settings,
            default_document,
            #[cfg(test)]
            label_refreshes: 0,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Takes settings already accepted by [`crate::config::ConfigManager`],
    /// which keeps the key separator and storage fields fixed.
    pub fn apply_settings(&mut self, settings: EditorSettings) {
        self.settings = settings;
    }

    #[must_use]
    pub fn state(&self) -> EditorState {
        if self.documents.is_empty() { EditorState::Empty } else { EditorState::Populated }
    }

    #[must_use]
    pub const fn documents(&self) -> &DocumentSet {
        &self.documents
    }

    /// Names of the loaded documents, in order.
    #[must_use]
    pub fn language_options(&self) -> Vec<String> {
        self.documents.names().map(str::to_string).collect()
    }

    #[must_use]
    pub fn default_document_name(&self) -> Option<&str> {
        self.default_document.as_deref()
    }

    /// # Errors
    /// [`EditorError::UnknownDocument`] if no document has that name.
    pub fn set_default_document(&mut self, name: &str) -> Result<(), EditorError> {
        if self.documents.get(name).is_none() {
            return Err(EditorError::UnknownDocument(name.to_string()));
        }
        self.default_document = Some(name.to_string());
        Ok(())
    }

    /// Reads every source, then applies the batch in one step.
    ///
    /// # Errors
    /// - [`EditorError::UploadAborted`] when a file failed and the policy is `abort`
    /// - Store errors
    pub async fn upload_batch(
        &mut self,
        sources: Vec<UploadSource>,
    ) -> Result<UploadReport, EditorError> {
        let batch = load_batch(sources).await;
        self.apply_batch(batch.documents, batch.failures)
    }

    /// Applies already-parsed documents.
    ///
    /// # Errors
    /// Returns error if the new state cannot be saved.
    pub fn upload_parsed(
        &mut self,
        documents: Vec<ParsedDocument>,
    ) -> Result<UploadReport, EditorError> {
        self.apply_batch(documents, Vec::new())
    }

    /// Applies a loaded batch according to the upload failure policy.
    ///
    /// # Errors
    /// - [`EditorError::UploadAborted`] when a file failed and the policy is `abort`
    /// - Store errors
    pub fn apply_batch(
        &mut self,
        documents: Vec<ParsedDocument>,
        failures: Vec<UploadError>,
    ) -> Result<UploadReport, EditorError> {
        if !failures.is_empty() && self.settings.upload_failure_policy == UploadFailurePolicy::Abort
        {
            tracing::warn!(failed = failures.len(), "Aborting upload batch");
            return Err(EditorError::UploadAborted { failures });
        }

        let summary = self.documents.upload_batch(documents);
        self.lookup.invalidate();
        self.refresh_labels();
        self.default_document = self.documents.names().next().map(str::to_string);
        tracing::info!(
            added = summary.added.len(),
            replaced = summary.replaced.len(),
            backfilled = summary.backfilled,
            skipped = failures.len(),
            "Applied upload batch"
        );

        self.persist()?;
        Ok(UploadReport { summary, errors: failures.iter().map(ToString::to_string).collect() })
    }

    /// Label index of the current documents, memoized between changes.
    #[must_use]
    pub fn labels(&self) -> LabelIndex {
        label_index(&self.db, self.contributions)
    }

    /// Ordered `(key, languages)` rows.
    #[must_use]
    pub fn labels_view(&self) -> Vec<LabelEntry> {
        self.labels().view()
    }

    /// Display value of `key` in document `name`; empty when absent.
    pub fn value_for(&mut self, name: &str, key: &str) -> String {
        self.lookup.get(&self.documents, name, key)
    }

    /// Keys with no translation in document `name`.
    #[must_use]
    pub fn missing_translations(&self, name: &str) -> Vec<String> {
        self.documents.get(name).map_or_else(Vec::new, |document| {
            document
                .data()
                .iter()
                .filter(|(_, leaf)| leaf.is_blank())
                .map(|(key, _)| key.clone())
                .collect()
        })
    }

    /// Sets a translation. Unknown documents are ignored.
    ///
    /// Returns whether the document existed.
    ///
    /// # Errors
    /// Returns error if the new state cannot be saved.
    pub fn edit_value(&mut self, name: &str, key: &str, value: &str) -> Result<bool, EditorError> {
        if !self.lookup.set(&mut self.documents, name, key, value) {
            return Ok(false);
        }
        self.refresh_labels();
        self.persist()?;
        Ok(true)
    }

    /// Rebuilds every document for download; conflicting documents land in `failures`.
    #[must_use]
    pub fn export_all(&self) -> ExportBatch {
        export_all(&self.documents)
    }

    /// Drops every document. Callers confirm with the user first.
    ///
    /// # Errors
    /// Returns error if the empty state cannot be saved.
    pub fn reset_all(&mut self) -> Result<(), EditorError> {
        self.documents.reset();
        self.lookup.invalidate();
        self.refresh_labels();
        self.default_document = None;
        tracing::info!("Reset all documents");
        self.persist()
    }

    /// Replaces the salsa input when contributions actually changed, so
    /// unchanged documents keep the memoized label index.
    fn refresh_labels(&mut self) {
        let next = contributions_of(&self.documents);
        if self.contributions.entries(&self.db) == &next {
            return;
        }
        self.contributions.set_entries(&mut self.db).to(next);
        #[cfg(test)]
        {
            self.label_refreshes += 1;
        }
    }

    fn persist(&self) -> Result<(), EditorError> {
        self.store.save(self.documents.documents()).map_err(|error| {
            tracing::error!(%error, "Failed to save editor state");
            EditorError::from(error)
        })
    }
}
