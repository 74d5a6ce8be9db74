//! Entry point for the bulk editor JSON-RPC server.

use i18n_bulk_editor::Backend;
use tower_lsp::{
    LspService,
    Server,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout carries JSON-RPC, so logs go to stderr.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt().with_env_filter(env_filter).with_ansi(false).with_writer(writer).init();

    let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());
    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
