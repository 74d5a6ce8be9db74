//! JSON-RPC handler modules (internal to `ide::backend`).

#![allow(unreachable_pub)]

pub mod execute_command;
pub mod lifecycle;
pub mod workspace;
