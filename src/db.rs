//! Salsa database definition.

/// Database trait for the editor's derived views.
#[salsa::db]
pub trait EditorDatabase: salsa::Database {}

/// Editor database implementation.
#[salsa::db]
#[derive(Clone, Default)]
pub struct EditorDatabaseImpl {
    /// Salsa storage.
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for EditorDatabaseImpl {}

#[salsa::db]
impl EditorDatabase for EditorDatabaseImpl {}

impl std::fmt::Debug for EditorDatabaseImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorDatabaseImpl").finish_non_exhaustive()
    }
}
