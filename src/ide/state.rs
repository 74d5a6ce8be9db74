//! Shared server state.

use std::sync::Arc;

use tokio::sync::{
    Mutex,
    MutexGuard,
};

use crate::editor::Editor;

/// State shared between handlers.
///
/// # Lock order
///
/// Take `Backend::config_manager` before `editor` when both are needed.
#[derive(Clone)]
pub struct ServerState {
    pub editor: Arc<Mutex<Editor>>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState").field("editor", &"<Editor>").finish()
    }
}

impl ServerState {
    #[must_use]
    pub fn new(editor: Editor) -> Self {
        Self { editor: Arc::new(Mutex::new(editor)) }
    }

    pub async fn editor(&self) -> MutexGuard<'_, Editor> {
        self.editor.lock().await
    }

    /// Swaps in a new session, e.g. once the workspace storage is known.
    pub async fn replace_editor(&self, editor: Editor) {
        *self.editor.lock().await = editor;
    }
}
