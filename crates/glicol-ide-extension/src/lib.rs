//! Editor extension shim for the Glicol language server.
//!
//! The crate exposes the two lifecycle entry points the host invokes:
//! [`activate`] resolves the server launch from the environment, creates
//! the protocol trace channel, and starts the language client; [`deactivate`]
//! tears the single stored session down and is a safe no-op when nothing
//! was started. All protocol work lives in `glicol-ide-client`; all the
//! hard analysis lives in the external `glicol-lsp` process.

mod extension;
mod session;
mod telemetry;

pub use extension::{
    Deactivation, Extension, ExtensionContext, ExtensionError, activate, deactivate,
};
pub use session::ClientSession;
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
