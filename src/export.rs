//! Rebuilding nested documents for download.

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};

use serde::Serialize;
use thiserror::Error;

use crate::document::{
    Document,
    DocumentSet,
};
use crate::flatten::{
    FlatMap,
    UnflattenError,
    is_nested_path,
    unflatten,
};
use crate::value::{
    Leaf,
    Node,
};

/// Content type of every exported file.
pub const CONTENT_TYPE: &str = "application/json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot export '{name}': {source}")]
    Conflict {
        name: String,
        #[source]
        source: UnflattenError,
    },

    #[error("Failed to serialize '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// The document the error is about, if any.
    #[must_use]
    pub fn document_name(&self) -> Option<&str> {
        match self {
            Self::Conflict { name, .. } | Self::Render { name, .. } => Some(name),
            Self::Io { .. } => None,
        }
    }
}

/// One document ready to be written to `<name>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub name: String,
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Node,
}

/// Wire form of an export, with the body already rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedExport {
    pub name: String,
    pub file_name: String,
    pub content_type: &'static str,
    pub content: String,
}

impl ExportedDocument {
    /// JSON text of the body, compact unless `pretty`.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn render(&self, pretty: bool) -> Result<String, ExportError> {
        let rendered = if pretty {
            serde_json::to_string_pretty(&self.body)
        } else {
            serde_json::to_string(&self.body)
        };
        rendered.map_err(|source| ExportError::Render { name: self.name.clone(), source })
    }

    /// # Errors
    /// Returns error if serialization fails.
    pub fn rendered(&self, pretty: bool) -> Result<RenderedExport, ExportError> {
        Ok(RenderedExport {
            name: self.name.clone(),
            file_name: self.file_name.clone(),
            content_type: self.content_type,
            content: self.render(pretty)?,
        })
    }
}

/// Outcome of exporting a set. Every document lands in exactly one list.
#[derive(Debug, Default)]
pub struct ExportBatch {
    pub documents: Vec<ExportedDocument>,
    pub failures: Vec<ExportError>,
}

/// Rebuilds every document, in set order.
///
/// Documents are independent: one with conflicting keys is reported in
/// `failures` and the others still export.
#[must_use]
pub fn export_all(documents: &DocumentSet) -> ExportBatch {
    let mut batch = ExportBatch::default();
    for document in documents.documents() {
        match export_document(document, documents.key_separator()) {
            Ok(exported) => batch.documents.push(exported),
            Err(error) => {
                tracing::error!(%error, "Skipping document in export");
                batch.failures.push(error);
            }
        }
    }
    batch
}

/// Rebuilds one document.
///
/// Empty values that reconciliation filled in are left out when they clash
/// with the document's own keys: `title` backfilled into a document that has
/// `title.short` is dropped, and so is `title.short` in one that has `title`.
///
/// # Errors
/// [`ExportError::Conflict`] when the document's own keys conflict.
pub fn export_document(
    document: &Document,
    separator: &str,
) -> Result<ExportedDocument, ExportError> {
    let shadowed = shadowed_backfills(document, separator);
    let body = if shadowed.is_empty() {
        unflatten(document.data(), separator)
    } else {
        tracing::debug!(
            name = document.name(),
            dropped = shadowed.len(),
            "Dropping clashing backfilled keys"
        );
        let kept: FlatMap = document
            .data()
            .iter()
            .filter(|(key, _)| !shadowed.contains(key.as_str()))
            .map(|(key, leaf)| (key.clone(), leaf.clone()))
            .collect();
        unflatten(&kept, separator)
    }
    .map_err(|source| ExportError::Conflict { name: document.name().to_string(), source })?;

    Ok(ExportedDocument {
        name: document.name().to_string(),
        file_name: format!("{}.json", document.name()),
        content_type: CONTENT_TYPE,
        body,
    })
}

/// Blank, non-contributed keys that nest above or below a key the document keeps.
fn shadowed_backfills<'a>(document: &'a Document, separator: &str) -> HashSet<&'a str> {
    let is_backfill =
        |key: &str, leaf: &Leaf| leaf.is_blank() && !document.contributed().contains(key);
    let (backfilled, kept): (Vec<_>, Vec<_>) =
        document.data().iter().partition(|(key, leaf)| is_backfill(key, leaf));

    backfilled
        .into_iter()
        .map(|(key, _)| key.as_str())
        .filter(|key| {
            kept.iter().any(|(other, _)| {
                is_nested_path(key, other, separator) || is_nested_path(other, key, separator)
            })
        })
        .collect()
}

/// Writes each export to `directory/<file_name>`, creating the directory if needed.
///
/// Returns the written paths in order.
///
/// # Errors
/// Returns error if a file cannot be rendered or written.
pub async fn write_exports(
    directory: &Path,
    exports: &[ExportedDocument],
    pretty: bool,
) -> Result<Vec<PathBuf>, ExportError> {
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|source| ExportError::Io { path: directory.to_path_buf(), source })?;

    let mut written = Vec::with_capacity(exports.len());
    for export in exports {
        let path = directory.join(&export.file_name);
        let content = export.render(pretty)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| ExportError::Io { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "Exported translation file");
        written.push(path);
    }
    Ok(written)
}
