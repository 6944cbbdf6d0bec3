//! Internal session state for the language client.

use std::collections::HashSet;
use std::process::Child;

use lsp_types::Uri;

use crate::transport::StdioTransport;
use crate::watcher::SettingsWatcher;

/// Lifecycle state of a client session.
///
/// Transitions are `NotStarted → Running → Stopped`; `Stopped` is terminal
/// for the session.
pub(crate) enum SessionState {
    /// No server process has been started.
    NotStarted,
    /// Server process is running and the session is live.
    Running(RunningSession),
    /// The session has been stopped.
    Stopped,
}

/// Resources owned by a live session.
pub(crate) struct RunningSession {
    /// The spawned server process.
    pub(crate) child: Child,
    /// Framed transport over the child's stdio.
    pub(crate) transport: StdioTransport,
    /// Watcher feeding `workspace/didChangeWatchedFiles`, when configured.
    pub(crate) watcher: Option<SettingsWatcher>,
    /// Documents currently opened with the server.
    pub(crate) open_documents: HashSet<Uri>,
}
