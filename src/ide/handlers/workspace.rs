//! Workspace-related handlers.

use tower_lsp::lsp_types::DidChangeConfigurationParams;

use super::super::backend::Backend;

/// Merges pushed settings into the running session.
pub async fn handle_did_change_configuration(
    backend: &Backend,
    params: DidChangeConfigurationParams,
) {
    tracing::info!(settings = %params.settings, "didChangeConfiguration received");

    let mut config_manager = backend.config_manager.lock().await;
    let settings = match config_manager.apply_client_settings(params.settings) {
        Ok(Some(settings)) => settings.clone(),
        Ok(None) => {
            tracing::debug!("settings push has no editor settings, ignoring");
            return;
        }
        Err(error) => {
            tracing::warn!(%error, "settings change rejected");
            return;
        }
    };
    drop(config_manager);

    backend.state.editor().await.apply_settings(settings);
    tracing::info!("configuration updated successfully");
}
