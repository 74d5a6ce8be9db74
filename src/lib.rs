//! i18n-bulk-editor
//!
//! Edits a set of JSON translation files side by side: nested documents are
//! flattened into dotted keys, reconciled to share one key set, edited, and
//! rebuilt for export.

pub mod config;
pub mod db;
pub mod document;
pub mod editor;
pub mod export;
pub mod flatten;
pub mod ide;
pub mod labels;
pub mod lookup;
pub mod store;
pub mod value;

pub use editor::Editor;
pub use ide::backend::Backend;
