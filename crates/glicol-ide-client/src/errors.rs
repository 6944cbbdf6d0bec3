//! Error types for the language client session.

use std::io;

use thiserror::Error;

use crate::protocol::RpcError;

/// Errors raised while framing messages over the server's stdio.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing Content-Length header.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// Invalid header format.
    #[error("invalid header format")]
    InvalidHeader,
}

/// Errors raised by the language client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server executable was not found.
    #[error("language server binary not found: {command}")]
    BinaryNotFound {
        /// The command that was not found.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to spawn the server process.
    #[error("failed to spawn language server process: {message}")]
    SpawnFailed {
        /// Description of the spawn failure.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Transport-level I/O error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// JSON serialization/deserialization error.
    #[error("JSON codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The server returned an error response.
    #[error("server returned error: {message} (code: {code})")]
    ServerError {
        /// The JSON-RPC error code.
        code: i64,
        /// The error message from the server.
        message: String,
    },

    /// The initialize handshake failed.
    #[error("initialization failed: {message}")]
    HandshakeFailed {
        /// Description of the handshake failure.
        message: String,
    },

    /// An operation was requested while no session is running.
    #[error("language client is not running")]
    NotRunning,

    /// Start was requested while a session is already running.
    #[error("language client is already running")]
    AlreadyRunning,

    /// Start was requested after the session was stopped.
    ///
    /// A stopped session is terminal; the host creates a fresh client for
    /// a new activation instead of restarting an old one.
    #[error("language client session has already been stopped")]
    SessionStopped,

    /// No matching response arrived within the bounded receive window.
    #[error("no response received for request {request_id}")]
    UnansweredRequest {
        /// Identifier of the request that went unanswered.
        request_id: i64,
    },

    /// A file path could not be represented as a file URI.
    #[error("cannot convert path to file URI: {path}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// The settings watcher could not be installed.
    #[error("failed to watch {path}: {source}")]
    WatchFailed {
        /// Directory the watcher was asked to observe.
        path: String,
        /// The underlying watcher error.
        #[source]
        source: notify::Error,
    },
}

impl ClientError {
    /// Creates a server error from a JSON-RPC error object.
    #[must_use]
    pub fn from_rpc(error: RpcError) -> Self {
        Self::ServerError {
            code: error.code,
            message: error.message,
        }
    }
}
