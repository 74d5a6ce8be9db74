//! Translation documents and the set they live in.

mod loader;
mod set;

pub use loader::{
    BatchLoad,
    ParsedDocument,
    UploadError,
    UploadSource,
    discover_translation_files,
    document_name,
    load_batch,
    parse_document,
};
pub use set::{
    Document,
    DocumentSet,
    Snapshot,
    UploadSummary,
};
