//! JSON-RPC surface over the editor.

pub mod backend;
mod handlers;
pub mod state;
