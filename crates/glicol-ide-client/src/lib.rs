//! Editor-side language client for the Glicol language server.
//!
//! The crate owns the lifecycle of a single `glicol-lsp` session: spawning
//! the external process, JSON-RPC 2.0 over stdio with LSP header framing,
//! the initialize/shutdown handshake, document synchronisation, settings
//! file watching, and a UI-visible protocol trace channel. The host shim
//! drives it through [`LanguageClient::start`] and [`LanguageClient::stop`];
//! everything server-side (analysis, diagnostics, hover) stays in the
//! external process.

mod client;
mod errors;
mod messaging;
mod options;
mod protocol;
mod state;
mod trace;
mod transport;
mod uri;
mod watcher;

pub use client::LanguageClient;
pub use errors::{ClientError, TransportError};
pub use options::ClientOptions;
pub use protocol::{
    Incoming, Notification, Request, RequestIdSequence, Response, RpcError, ServerNotification,
    ServerRequest,
};
pub use trace::{MemoryOutputChannel, OutputChannel, ProtocolTrace, TracingOutputChannel};
pub use transport::{FramedTransport, StdioTransport};
