//! JSON-RPC backend.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    ExecuteCommandParams,
    InitializeParams,
    InitializeResult,
    InitializedParams,
};
use tower_lsp::{
    Client,
    LanguageServer,
};

use super::handlers;
use super::state::ServerState;
use crate::config::{
    ConfigManager,
    EditorSettings,
};
use crate::editor::Editor;
use crate::store::{
    FileStateStore,
    MemoryStateStore,
    StateStore,
};

/// Backend
#[derive(Clone)]
pub struct Backend {
    pub client: Client,
    pub config_manager: Arc<Mutex<ConfigManager>>,
    pub state: ServerState,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// A backend with an in-memory session, until `initialize` names a workspace.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            state: ServerState::new(Editor::in_memory(EditorSettings::default())),
        }
    }

    /// Opens the session described by the current settings.
    ///
    /// Falls back to an empty in-memory session when stored state is unreadable.
    pub(crate) async fn open_editor(&self) {
        let (settings, storage_file) = {
            let config_manager = self.config_manager.lock().await;
            (config_manager.get_settings().clone(), config_manager.storage_file())
        };

        let store: Arc<dyn StateStore> = match storage_file {
            Some(path) => {
                tracing::info!(path = %path.display(), "Using state file");
                Arc::new(FileStateStore::new(path, settings.storage_key.clone()))
            }
            None => {
                tracing::info!("No state file configured, keeping state in memory");
                Arc::new(MemoryStateStore::new())
            }
        };

        let editor = match Editor::open(store, settings.clone()) {
            Ok(editor) => editor,
            Err(error) => {
                tracing::error!(%error, "Failed to restore editor state");
                Editor::in_memory(settings)
            }
        };
        self.state.replace_editor(editor).await;
    }

    /// Resolves `path` against the workspace root when it is relative.
    pub(crate) async fn resolve_path(&self, path: &Path) -> PathBuf {
        self.config_manager.lock().await.resolve(path)
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::lifecycle::handle_initialize(self, params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        handlers::lifecycle::handle_initialized(self, params).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::lifecycle::handle_shutdown().await
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handlers::workspace::handle_did_change_configuration(self, params).await;
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        handlers::execute_command::handle_execute_command(self, params).await
    }
}
