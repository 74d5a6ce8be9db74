//! Execute Command handlers.
//!
//! Every editor operation is a `workspace/executeCommand` command taking at
//! most one camelCase object argument. Bad arguments are logged and answered
//! with `null`.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::ExecuteCommandParams;

use super::super::backend::Backend;
use crate::document::{
    UploadSource,
    discover_translation_files,
    load_batch,
};
use crate::editor::{
    EditorError,
    UploadReport,
};
use crate::export::{
    ExportError,
    RenderedExport,
    write_exports,
};

/// Commands advertised in the `initialize` response.
pub const COMMANDS: &[&str] = &[
    "i18n.uploadBatch",
    "i18n.uploadDirectory",
    "i18n.labelsView",
    "i18n.valueFor",
    "i18n.editValue",
    "i18n.exportAll",
    "i18n.resetAll",
    "i18n.getDefaultLanguage",
    "i18n.setDefaultLanguage",
    "i18n.missingTranslations",
    "i18n.getState",
];

pub async fn handle_execute_command(
    backend: &Backend,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    tracing::debug!(command = %params.command, "Execute Command request");

    let arguments = params.arguments;
    match params.command.as_str() {
        "i18n.uploadBatch" => handle_upload_batch(backend, &arguments).await,
        "i18n.uploadDirectory" => handle_upload_directory(backend, &arguments).await,
        "i18n.labelsView" => handle_labels_view(backend).await,
        "i18n.valueFor" => handle_value_for(backend, &arguments).await,
        "i18n.editValue" => handle_edit_value(backend, &arguments).await,
        "i18n.exportAll" => handle_export_all(backend, &arguments).await,
        "i18n.resetAll" => handle_reset_all(backend, &arguments).await,
        "i18n.getDefaultLanguage" => handle_get_default_language(backend).await,
        "i18n.setDefaultLanguage" => handle_set_default_language(backend, &arguments).await,
        "i18n.missingTranslations" => handle_missing_translations(backend, &arguments).await,
        "i18n.getState" => handle_get_state(backend).await,
        _ => {
            tracing::warn!("Unknown command: {}", params.command);
            Ok(None)
        }
    }
}

/// Parses the first argument; a missing argument reads as `{}`.
fn parse_args<T: DeserializeOwned>(command: &str, arguments: &[Value]) -> Option<T> {
    let first = arguments.first().cloned().unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    match serde_json::from_value(first) {
        Ok(args) => Some(args),
        Err(e) => {
            tracing::warn!("Invalid arguments for {}: {}", command, e);
            None
        }
    }
}

fn to_response<T: Serialize>(command: &str, value: &T) -> Result<Option<Value>> {
    match serde_json::to_value(value) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::error!("Failed to serialize result of {}: {}", command, e);
            Ok(None)
        }
    }
}

/// One file of `i18n.uploadBatch`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UploadFileArg {
    Path {
        path: PathBuf,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        file_name: String,
        content: String,
    },
}

#[derive(Debug, Deserialize)]
struct UploadBatchArgs {
    files: Vec<UploadFileArg>,
}

async fn handle_upload_batch(backend: &Backend, arguments: &[Value]) -> Result<Option<Value>> {
    let Some(args) = parse_args::<UploadBatchArgs>("i18n.uploadBatch", arguments) else {
        return Ok(None);
    };

    let mut sources = Vec::with_capacity(args.files.len());
    for file in args.files {
        sources.push(match file {
            UploadFileArg::Path { path } => UploadSource::Path(backend.resolve_path(&path).await),
            UploadFileArg::Inline { file_name, content } => {
                UploadSource::Inline { file_name, content }
            }
        });
    }

    upload(backend, "i18n.uploadBatch", sources).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UploadDirectoryArgs {
    /// Defaults to the workspace root.
    directory: Option<PathBuf>,
}

async fn handle_upload_directory(backend: &Backend, arguments: &[Value]) -> Result<Option<Value>> {
    let Some(args) = parse_args::<UploadDirectoryArgs>("i18n.uploadDirectory", arguments) else {
        return Ok(None);
    };

    let (root, pattern) = {
        let config_manager = backend.config_manager.lock().await;
        let root = match args.directory {
            Some(directory) => Some(directory),
            None => config_manager.workspace_root().cloned(),
        };
        (root, config_manager.get_settings().translation_files.file_pattern.clone())
    };
    let Some(root) = root else {
        tracing::warn!("i18n.uploadDirectory needs a directory when no workspace is open");
        return Ok(None);
    };
    let root = backend.resolve_path(&root).await;

    let files = match discover_translation_files(&root, &pattern) {
        Ok(files) => files,
        Err(error) => {
            tracing::error!(%error, "Failed to discover translation files");
            return Ok(None);
        }
    };
    tracing::debug!(root = %root.display(), files = files.len(), "Discovered translation files");

    upload(backend, "i18n.uploadDirectory", files.into_iter().map(UploadSource::Path).collect())
        .await
}

/// Reads the sources without holding the editor, then applies them.
async fn upload(
    backend: &Backend,
    command: &str,
    sources: Vec<UploadSource>,
) -> Result<Option<Value>> {
    let batch = load_batch(sources).await;

    let mut editor = backend.state.editor().await;
    let result = editor.apply_batch(batch.documents, batch.failures);
    drop(editor);

    match result {
        Ok(report) => to_response(command, &report),
        Err(EditorError::UploadAborted { failures }) => to_response(
            command,
            &UploadReport {
                errors: failures.iter().map(ToString::to_string).collect(),
                ..UploadReport::default()
            },
        ),
        Err(error) => {
            tracing::error!(%error, "{} failed", command);
            Ok(None)
        }
    }
}

async fn handle_labels_view(backend: &Backend) -> Result<Option<Value>> {
    let labels = backend.state.editor().await.labels_view();
    to_response("i18n.labelsView", &labels)
}

#[derive(Debug, Deserialize)]
struct ValueForArgs {
    language: String,
    key: String,
}

async fn handle_value_for(backend: &Backend, arguments: &[Value]) -> Result<Option<Value>> {
    let Some(args) = parse_args::<ValueForArgs>("i18n.valueFor", arguments) else {
        return Ok(None);
    };

    let value = backend.state.editor().await.value_for(&args.language, &args.key);
    Ok(Some(Value::String(value)))
}

#[derive(Debug, Deserialize)]
struct EditValueArgs {
    language: String,
    key: String,
    value: String,
}

async fn handle_edit_value(backend: &Backend, arguments: &[Value]) -> Result<Option<Value>> {
    let Some(args) = parse_args::<EditValueArgs>("i18n.editValue", arguments) else {
        return Ok(None);
    };

    tracing::debug!(language = %args.language, key = %args.key, "Executing i18n.editValue");
    let mut editor = backend.state.editor().await;
    if let Err(error) = editor.edit_value(&args.language, &args.key, &args.value) {
        tracing::error!(%error, "i18n.editValue failed");
    }
    Ok(None)
}

/// A document that could not be exported, or a write that failed.
#[derive(Debug, Serialize)]
struct ExportFailure {
    name: Option<String>,
    message: String,
}

impl From<&ExportError> for ExportFailure {
    fn from(error: &ExportError) -> Self {
        Self { name: error.document_name().map(str::to_string), message: error.to_string() }
    }
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    documents: Vec<RenderedExport>,
    errors: Vec<ExportFailure>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportAllArgs {
    /// Overrides the `exportDirectory` setting.
    directory: Option<PathBuf>,
}

async fn handle_export_all(backend: &Backend, arguments: &[Value]) -> Result<Option<Value>> {
    let Some(args) = parse_args::<ExportAllArgs>("i18n.exportAll", arguments) else {
        return Ok(None);
    };

    let (pretty, configured_dir) = {
        let config_manager = backend.config_manager.lock().await;
        (config_manager.get_settings().export_format.pretty, config_manager.export_dir())
    };
    let directory = match args.directory {
        Some(directory) => Some(backend.resolve_path(&directory).await),
        None => configured_dir,
    };

    let batch = backend.state.editor().await.export_all();
    let mut response = ExportResponse {
        documents: Vec::with_capacity(batch.documents.len()),
        errors: batch.failures.iter().map(ExportFailure::from).collect(),
    };
    let mut exported = Vec::with_capacity(batch.documents.len());
    for document in batch.documents {
        match document.rendered(pretty) {
            Ok(rendered) => {
                response.documents.push(rendered);
                exported.push(document);
            }
            Err(error) => response.errors.push(ExportFailure::from(&error)),
        }
    }

    if let Some(directory) = directory {
        match write_exports(&directory, &exported, pretty).await {
            Ok(written) => {
                tracing::info!(directory = %directory.display(), files = written.len(), "Wrote exports");
            }
            Err(error) => {
                tracing::error!(%error, "Failed to write exports");
                response.errors.push(ExportFailure::from(&error));
            }
        }
    }

    to_response("i18n.exportAll", &response)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResetAllArgs {
    confirmed: bool,
}

async fn handle_reset_all(backend: &Backend, arguments: &[Value]) -> Result<Option<Value>> {
    let Some(args) = parse_args::<ResetAllArgs>("i18n.resetAll", arguments) else {
        return Ok(None);
    };
    if !args.confirmed {
        tracing::warn!("i18n.resetAll refused without confirmation");
        return Ok(None);
    }

    if let Err(error) = backend.state.editor().await.reset_all() {
        tracing::error!(%error, "i18n.resetAll failed");
    }
    Ok(None)
}

async fn handle_get_default_language(backend: &Backend) -> Result<Option<Value>> {
    let editor = backend.state.editor().await;
    let name = editor.default_document_name().map(str::to_string);
    drop(editor);
    Ok(Some(name.map_or(Value::Null, Value::String)))
}

#[derive(Debug, Deserialize)]
struct LanguageArgs {
    language: String,
}

async fn handle_set_default_language(
    backend: &Backend,
    arguments: &[Value],
) -> Result<Option<Value>> {
    let Some(args) = parse_args::<LanguageArgs>("i18n.setDefaultLanguage", arguments) else {
        return Ok(None);
    };

    if let Err(error) = backend.state.editor().await.set_default_document(&args.language) {
        tracing::warn!(%error, "i18n.setDefaultLanguage failed");
    }
    Ok(None)
}

async fn handle_missing_translations(
    backend: &Backend,
    arguments: &[Value],
) -> Result<Option<Value>> {
    let Some(args) = parse_args::<LanguageArgs>("i18n.missingTranslations", arguments) else {
        return Ok(None);
    };

    let missing = backend.state.editor().await.missing_translations(&args.language);
    to_response("i18n.missingTranslations", &missing)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StateResponse {
    state: crate::editor::EditorState,
    languages: Vec<String>,
    default_language: Option<String>,
}

async fn handle_get_state(backend: &Backend) -> Result<Option<Value>> {
    let editor = backend.state.editor().await;
    let response = StateResponse {
        state: editor.state(),
        languages: editor.language_options(),
        default_language: editor.default_document_name().map(str::to_string),
    };
    drop(editor);
    to_response("i18n.getState", &response)
}
