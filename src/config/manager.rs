//! Session configuration: the workspace config file, client pushes, and the
//! paths derived from them.

use std::path::{
    Path,
    PathBuf,
};

use serde_json::Value;

use super::{
    ConfigError,
    EditorSettings,
};

/// Config file looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = ".i18n-bulk-editor.json";

/// Section clients nest editor settings under.
const CLIENT_SECTION: &str = "i18nBulkEditor";

/// Top-level keys that identify an unwrapped settings push.
const SETTING_KEYS: &[&str] = &[
    "translationFiles",
    "keySeparator",
    "storageKey",
    "storagePath",
    "exportDirectory",
    "exportFormat",
    "uploadFailurePolicy",
];

/// Owns the active [`EditorSettings`] and the workspace they resolve against.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    current_settings: EditorSettings,
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session: reads [`CONFIG_FILE_NAME`] from `workspace_root`
    /// when present, defaults otherwise.
    ///
    /// # Errors
    /// The file cannot be read or parsed, or its settings are invalid.
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        let settings = match &workspace_root {
            Some(root) => read_config_file(root)?.unwrap_or_default(),
            None => EditorSettings::default(),
        };
        settings.validate().map_err(ConfigError::ValidationErrors)?;

        tracing::debug!(?workspace_root, ?settings, "session settings loaded");
        self.current_settings = settings;
        self.workspace_root = workspace_root;
        Ok(())
    }

    /// Replaces the settings mid-session.
    ///
    /// Stored keys were split with the session's separator and live in the
    /// session's storage slot, so those fields must stay as loaded.
    ///
    /// # Errors
    /// - The new settings are invalid
    /// - They change `keySeparator`, `storageKey` or `storagePath`
    pub fn update_settings(&mut self, new_settings: EditorSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        let fixed = self.fixed_field_changes(&new_settings);
        if !fixed.is_empty() {
            return Err(ConfigError::FixedForSession(fixed));
        }

        self.current_settings = new_settings;
        Ok(())
    }

    /// Merges a `workspace/didChangeConfiguration` payload into the current
    /// settings.
    ///
    /// The payload is either wrapped in `i18nBulkEditor` or bare; a bare
    /// payload counts only when it names at least one editor setting. Fields
    /// the payload leaves out keep their current values.
    ///
    /// Returns `None` when the payload carries nothing for this editor.
    ///
    /// # Errors
    /// The merged settings fail to parse or are rejected by
    /// [`ConfigManager::update_settings`].
    pub fn apply_client_settings(
        &mut self,
        pushed: Value,
    ) -> Result<Option<&EditorSettings>, ConfigError> {
        let Some(patch) = client_section(pushed) else {
            return Ok(None);
        };

        let mut merged = serde_json::to_value(&self.current_settings)?;
        merge_json(&mut merged, patch);
        self.update_settings(serde_json::from_value(merged)?)?;
        Ok(Some(&self.current_settings))
    }

    #[must_use]
    pub const fn get_settings(&self) -> &EditorSettings {
        &self.current_settings
    }

    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }

    /// State file location. `None` when persistence is off, or when the path
    /// is relative and no workspace is open.
    #[must_use]
    pub fn storage_file(&self) -> Option<PathBuf> {
        self.in_workspace(self.current_settings.storage_path.as_deref()?)
    }

    /// Default export directory, resolved like [`ConfigManager::storage_file`].
    #[must_use]
    pub fn export_dir(&self) -> Option<PathBuf> {
        self.in_workspace(self.current_settings.export_directory.as_deref()?)
    }

    /// Resolves a command-supplied path. Relative paths stay as given when
    /// no workspace is open.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.workspace_root.as_ref().map_or_else(|| path.to_path_buf(), |root| root.join(path))
    }

    fn in_workspace(&self, path: &str) -> Option<PathBuf> {
        let path = Path::new(path);
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }
        self.workspace_root.as_ref().map(|root| root.join(path))
    }

    fn fixed_field_changes(&self, next: &EditorSettings) -> Vec<&'static str> {
        let current = &self.current_settings;
        [
            ("keySeparator", current.key_separator != next.key_separator),
            ("storageKey", current.storage_key != next.storage_key),
            ("storagePath", current.storage_path != next.storage_path),
        ]
        .into_iter()
        .filter_map(|(field, changed)| changed.then_some(field))
        .collect()
    }
}

fn read_config_file(root: &Path) -> Result<Option<EditorSettings>, ConfigError> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        tracing::debug!(?path, "no config file");
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn client_section(pushed: Value) -> Option<Value> {
    let Value::Object(mut object) = pushed else {
        return None;
    };
    if let Some(section) = object.remove(CLIENT_SECTION) {
        return Some(section);
    }
    SETTING_KEYS.iter().any(|key| object.contains_key(*key)).then_some(Value::Object(object))
}

/// Object fields merge recursively; anything else replaces the base value.
fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::*;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::config::{
        ExportFormatConfig,
        UploadFailurePolicy,
    };

    fn workspace_with_config(content: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), content).unwrap();
        dir
    }

    #[rstest]
    fn test_new_has_no_workspace() {
        let manager = ConfigManager::new();

        assert_that!(manager.get_settings().key_separator, eq("."));
        assert_that!(manager.workspace_root(), none());
        assert_that!(manager.storage_file(), none());
    }

    #[rstest]
    fn test_load_settings_reads_config_file() {
        let dir = workspace_with_config(r#"{"keySeparator": "/", "exportFormat": {"pretty": true}}"#);
        let mut manager = ConfigManager::new();

        manager.load_settings(Some(dir.path().to_path_buf())).unwrap();

        assert_that!(manager.get_settings().key_separator, eq("/"));
        assert_that!(manager.get_settings().export_format.pretty, eq(true));
        assert_eq!(
            manager.storage_file(),
            Some(dir.path().join(".i18n-bulk-editor").join("state.json"))
        );
    }

    #[rstest]
    fn test_load_settings_without_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new();

        manager.load_settings(Some(dir.path().to_path_buf())).unwrap();

        assert_that!(manager.get_settings(), eq(&EditorSettings::default()));
        assert_that!(manager.workspace_root(), some(eq(&dir.path().to_path_buf())));
    }

    #[rstest]
    #[case::unparsable("invalid json")]
    #[case::invalid(r#"{"keySeparator": ""}"#)]
    fn test_load_settings_rejects_bad_config_file(#[case] content: &str) {
        let dir = workspace_with_config(content);
        let mut manager = ConfigManager::new();

        assert_that!(manager.load_settings(Some(dir.path().to_path_buf())), err(anything()));
        assert_that!(manager.workspace_root(), none());
    }

    #[rstest]
    fn test_update_settings_rejects_invalid() {
        let mut manager = ConfigManager::new();
        let settings = EditorSettings {
            export_directory: Some(String::new()),
            ..EditorSettings::default()
        };

        let result = manager.update_settings(settings);

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))), "{result:?}");
    }

    #[rstest]
    fn test_update_settings_rejects_session_fields() {
        let mut manager = ConfigManager::new();
        let settings = EditorSettings {
            key_separator: "/".to_string(),
            storage_path: None,
            upload_failure_policy: UploadFailurePolicy::Abort,
            ..EditorSettings::default()
        };

        let result = manager.update_settings(settings);

        let Err(ConfigError::FixedForSession(fields)) = result else {
            panic!("expected a session field rejection, got {result:?}");
        };
        assert_eq!(fields, vec!["keySeparator", "storagePath"]);
        assert_that!(manager.get_settings(), eq(&EditorSettings::default()));
    }

    #[rstest]
    fn test_update_settings_applies_live_fields() {
        let mut manager = ConfigManager::new();
        let settings = EditorSettings {
            upload_failure_policy: UploadFailurePolicy::Abort,
            ..EditorSettings::default()
        };

        manager.update_settings(settings).unwrap();

        assert_that!(manager.get_settings().upload_failure_policy, eq(UploadFailurePolicy::Abort));
    }

    #[rstest]
    #[case::wrapped(json!({ "i18nBulkEditor": { "exportFormat": { "pretty": true } } }))]
    #[case::bare(json!({ "exportFormat": { "pretty": true } }))]
    fn test_apply_client_settings_merges_partial_push(#[case] pushed: Value) {
        let mut manager = ConfigManager::new();
        manager
            .update_settings(EditorSettings {
                export_directory: Some("out".to_string()),
                ..EditorSettings::default()
            })
            .unwrap();

        let applied = manager.apply_client_settings(pushed).unwrap().cloned();

        assert_that!(
            applied,
            some(all![
                field!(EditorSettings.export_format, eq(&ExportFormatConfig { pretty: true })),
                field!(EditorSettings.export_directory, some(eq("out")))
            ])
        );
    }

    #[rstest]
    #[case::other_section(json!({ "editor": { "fontSize": 12 } }))]
    #[case::empty(json!({}))]
    #[case::not_an_object(json!(null))]
    fn test_apply_client_settings_ignores_foreign_push(#[case] pushed: Value) {
        let mut manager = ConfigManager::new();
        manager
            .update_settings(EditorSettings {
                upload_failure_policy: UploadFailurePolicy::Abort,
                ..EditorSettings::default()
            })
            .unwrap();

        assert_that!(manager.apply_client_settings(pushed), ok(none()));
        assert_that!(manager.get_settings().upload_failure_policy, eq(UploadFailurePolicy::Abort));
    }

    #[rstest]
    fn test_apply_client_settings_null_storage_path_is_a_change() {
        let mut manager = ConfigManager::new();

        let result = manager.apply_client_settings(json!({ "storagePath": null }));

        assert!(matches!(result, Err(ConfigError::FixedForSession(_))), "{result:?}");
    }

    #[rstest]
    fn test_storage_file_disabled_when_path_is_null() {
        let dir = workspace_with_config(r#"{"storagePath": null}"#);
        let mut manager = ConfigManager::new();

        manager.load_settings(Some(dir.path().to_path_buf())).unwrap();

        assert_that!(manager.storage_file(), none());
    }

    #[rstest]
    fn test_export_dir_absolute_ignores_workspace() {
        let dir = workspace_with_config(r#"{"exportDirectory": "/tmp/out"}"#);
        let mut manager = ConfigManager::new();

        manager.load_settings(Some(dir.path().to_path_buf())).unwrap();

        assert_eq!(manager.export_dir(), Some(PathBuf::from("/tmp/out")));
    }

    #[rstest]
    #[case::relative_with_root(Some("/ws"), "out", PathBuf::from("/ws/out"))]
    #[case::relative_without_root(None, "out", PathBuf::from("out"))]
    #[case::absolute(Some("/ws"), "/abs", PathBuf::from("/abs"))]
    fn test_resolve(#[case] root: Option<&str>, #[case] path: &str, #[case] expected: PathBuf) {
        let manager = ConfigManager {
            workspace_root: root.map(PathBuf::from),
            ..ConfigManager::default()
        };

        assert_eq!(manager.resolve(Path::new(path)), expected);
    }
}
