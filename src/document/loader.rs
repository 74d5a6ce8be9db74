//! Reading upload batches from disk or from inline content.

use std::path::{
    Path,
    PathBuf,
};

use globset::Glob;
use ignore::WalkBuilder;
use thiserror::Error;

use crate::value::Node;

/// Errors for a single file of an upload batch.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read translation file '{file_name}': {source}")]
    Io {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in '{file_name}': {source}")]
    Parse {
        file_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{file_name}' must contain a JSON object at its root, found {found}")]
    NotAnObject { file_name: String, found: &'static str },

    #[error("Invalid translation file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl UploadError {
    /// The file the error is about, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Io { file_name, .. }
            | Self::Parse { file_name, .. }
            | Self::NotAnObject { file_name, .. } => Some(file_name),
            Self::Pattern { .. } => None,
        }
    }
}

/// Where an uploaded file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// File content handed over directly (e.g., from a drop event).
    Inline { file_name: String, content: String },
}

impl UploadSource {
    /// File name the document name is derived from.
    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            Self::Path(path) => path.file_name().map_or_else(
                || path.to_string_lossy().to_string(),
                |name| name.to_string_lossy().to_string(),
            ),
            Self::Inline { file_name, .. } => file_name.clone(),
        }
    }
}

/// A successfully parsed upload, not yet flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub name: String,
    pub root: Node,
}

impl ParsedDocument {
    #[must_use]
    pub fn new(name: impl Into<String>, root: Node) -> Self {
        Self { name: name.into(), root }
    }
}

/// Result of loading a whole batch. Every source lands in exactly one list.
#[derive(Debug, Default)]
pub struct BatchLoad {
    pub documents: Vec<ParsedDocument>,
    pub failures: Vec<UploadError>,
}

/// Document name for a file: the file name without its `.json` suffix.
///
/// # Examples
/// - `en.json` → `en`
/// - `pt-BR.json` → `pt-BR`
/// - `messages.json.bak` → `messages.json.bak`
#[must_use]
pub fn document_name(file_name: &str) -> String {
    file_name.strip_suffix(".json").unwrap_or(file_name).to_string()
}

/// Parse one uploaded file.
///
/// # Errors
/// - Invalid JSON
/// - A root value that is not an object
pub fn parse_document(file_name: &str, content: &str) -> Result<ParsedDocument, UploadError> {
    let root: Node = serde_json::from_str(content)
        .map_err(|source| UploadError::Parse { file_name: file_name.to_string(), source })?;

    if root.as_mapping().is_none() {
        return Err(UploadError::NotAnObject {
            file_name: file_name.to_string(),
            found: root.type_name(),
        });
    }

    Ok(ParsedDocument::new(document_name(file_name), root))
}

/// Load every source of a batch concurrently.
///
/// Returns only after all reads have finished, so callers can reconcile
/// against the complete batch. Output order follows input order.
pub async fn load_batch(sources: Vec<UploadSource>) -> BatchLoad {
    tracing::debug!(files = sources.len(), "Loading upload batch");

    let futures: Vec<_> = sources.into_iter().map(load_source).collect();
    let results = futures::future::join_all(futures).await;

    let mut batch = BatchLoad::default();
    for result in results {
        match result {
            Ok(document) => batch.documents.push(document),
            Err(error) => {
                tracing::warn!(%error, "Skipping translation file");
                batch.failures.push(error);
            }
        }
    }
    batch
}

async fn load_source(source: UploadSource) -> Result<ParsedDocument, UploadError> {
    let file_name = source.file_name();
    let content = match source {
        UploadSource::Path(path) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| UploadError::Io { file_name: file_name.clone(), source })?,
        UploadSource::Inline { content, .. } => content,
    };
    parse_document(&file_name, &content)
}

/// Find translation files under `root` matching `pattern` (relative to `root`).
///
/// Honors `.gitignore`. Results are sorted by path.
///
/// # Errors
/// Returns error if the glob pattern is invalid.
pub fn discover_translation_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, UploadError> {
    let matcher = Glob::new(pattern)
        .map_err(|source| UploadError::Pattern { pattern: pattern.to_string(), source })?
        .compile_matcher();

    let mut found_files = Vec::new();
    for result in WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative_path) = path.strip_prefix(root) else {
            continue;
        };
        if matcher.is_match(relative_path) {
            found_files.push(path.to_path_buf());
        }
    }

    found_files.sort();
    tracing::debug!(root = %root.display(), files = found_files.len(), "Discovered translation files");
    Ok(found_files)
}
