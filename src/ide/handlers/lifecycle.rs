//! Lifecycle handlers: `initialize`, `initialized`, `shutdown`.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    ExecuteCommandOptions,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    ServerCapabilities,
    ServerInfo,
    WorkDoneProgressOptions,
};

use super::super::backend::Backend;
use super::execute_command::COMMANDS;

pub async fn handle_initialize(
    backend: &Backend,
    params: InitializeParams,
) -> Result<InitializeResult> {
    let workspace_root = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|folder| folder.uri.to_file_path().ok());

    let mut config_manager = backend.config_manager.lock().await;
    if let Err(error) = config_manager.load_settings(workspace_root) {
        tracing::error!(%error, "Configuration error during initialize");
    }
    drop(config_manager);

    backend.open_editor().await;

    Ok(InitializeResult {
        server_info: Some(ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
        capabilities: ServerCapabilities {
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(ToString::to_string).collect(),
                work_done_progress_options: WorkDoneProgressOptions::default(),
            }),
            ..ServerCapabilities::default()
        },
    })
}

pub async fn handle_initialized(backend: &Backend, _: InitializedParams) {
    let editor = backend.state.editor().await;
    tracing::info!(
        documents = editor.documents().len(),
        default_document = ?editor.default_document_name(),
        "initialized"
    );
}

#[allow(clippy::unused_async)]
pub async fn handle_shutdown() -> Result<()> {
    Ok(())
}
