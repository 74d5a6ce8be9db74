use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::store::DEFAULT_STORAGE_KEY;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "translationFiles.filePattern")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("{} cannot change during a session; restart the server to apply", .0.join(", "))]
    FixedForSession(Vec<&'static str>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub translation_files: TranslationFilesConfig,

    /// Separator between nested key segments in flat keys.
    pub key_separator: String,

    /// Storage slot holding the persisted document set.
    pub storage_key: String,

    /// State file, relative to the workspace root.
    /// `None` keeps state in memory only.
    pub storage_path: Option<String>,

    /// Directory exports are written to when a command does not name one.
    pub export_directory: Option<String>,

    pub export_format: ExportFormatConfig,

    pub upload_failure_policy: UploadFailurePolicy,
}

/// What to do with a batch when some of its files fail to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UploadFailurePolicy {
    /// Apply the files that loaded and report the others.
    #[default]
    Skip,
    /// Apply nothing if any file failed.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportFormatConfig {
    /// Indent exported JSON instead of writing it on one line.
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    pub file_pattern: String,
}

impl EditorSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.storage_key.is_empty() {
            errors.push(ValidationError::new(
                "storageKey",
                "The storage key cannot be empty. Example: \"translationFiles\"",
            ));
        }

        if let Some(path) = &self.storage_path
            && path.is_empty()
        {
            errors.push(ValidationError::new(
                "storagePath",
                "The path cannot be empty. Please specify a file path, or set it to null to keep state in memory",
            ));
        }

        if let Some(directory) = &self.export_directory
            && directory.is_empty()
        {
            errors.push(ValidationError::new(
                "exportDirectory",
                "The directory cannot be empty. Please specify a directory, or remove this field",
            ));
        }

        if self.translation_files.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.filePattern",
                "The pattern cannot be empty. Example: \"**/{locales,messages}/**/*.json\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.translation_files.file_pattern) {
            errors.push(ValidationError::new(
                "translationFiles.filePattern",
                format!("Invalid glob pattern '{}': {e}", self.translation_files.file_pattern),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self { file_pattern: "**/{locales,messages}/**/*.json".to_string() }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            translation_files: TranslationFilesConfig::default(),
            key_separator: ".".to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_path: Some(".i18n-bulk-editor/state.json".to_string()),
            export_directory: None,
            export_format: ExportFormatConfig::default(),
            upload_failure_policy: UploadFailurePolicy::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn validate_valid_settings() {
        let settings = EditorSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"keySeparator": "::", "uploadFailurePolicy": "abort"}"#;

        let settings: EditorSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.key_separator, eq("::"));
        assert_that!(settings.upload_failure_policy, eq(UploadFailurePolicy::Abort));
        assert_that!(settings.storage_key, eq("translationFiles"));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: EditorSettings = serde_json::from_str("{}").unwrap();

        assert_that!(settings.key_separator, eq("."));
        assert_that!(settings.storage_path, some(eq(".i18n-bulk-editor/state.json")));
        assert_that!(settings.export_directory, none());
        assert_that!(settings.export_format.pretty, eq(false));
        assert_that!(
            settings.translation_files.file_pattern,
            eq("**/{locales,messages}/**/*.json")
        );
    }

    #[rstest]
    fn deserialize_null_storage_path() {
        let settings: EditorSettings =
            serde_json::from_str(r#"{"storagePath": null}"#).unwrap();

        assert_that!(settings.storage_path, none());
    }

    #[rstest]
    fn validate_invalid_key_separator_empty() {
        let settings = EditorSettings { key_separator: String::new(), ..EditorSettings::default() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("keySeparator")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_storage_path_empty() {
        let settings =
            EditorSettings { storage_path: Some(String::new()), ..EditorSettings::default() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("storagePath")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_translation_file_pattern_invalid_glob() {
        let settings = EditorSettings {
            translation_files: TranslationFilesConfig {
                file_pattern: "**/{locales,messages/*.json".to_string(),
            },
            ..EditorSettings::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("translationFiles.filePattern")),
                field!(ValidationError.message, contains_substring("Invalid glob pattern"))
            ]])
        );
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = EditorSettings {
            key_separator: String::new(),
            storage_key: String::new(),
            ..EditorSettings::default()
        };

        let errors = settings.validate().unwrap_err();
        let config_error = ConfigError::ValidationErrors(errors);

        let error_message = format!("{config_error}");
        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. keySeparator"));
        assert_that!(error_message, contains_substring("2. storageKey"));
    }
}
