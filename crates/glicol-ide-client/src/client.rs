//! Language client session over a spawned server process.
//!
//! [`LanguageClient`] owns the whole editor-side session: it spawns the
//! external `glicol-lsp` process, runs the initialize handshake, forwards
//! document synchronisation and watched-file notifications, and tears the
//! process down again on stop. Spawn and handshake failures surface to the
//! caller unchanged; nothing is retried locally.

use std::collections::HashSet;
use std::io;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use lsp_types::{
    ClientCapabilities, DidChangeTextDocumentParams, DidChangeWatchedFilesClientCapabilities,
    DidChangeWatchedFilesParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, FileEvent,
    InitializeParams, InitializeResult, InitializedParams, SetTraceParams,
    TextDocumentClientCapabilities, TextDocumentContentChangeEvent, TextDocumentIdentifier,
    TextDocumentItem, TraceValue, Uri, VersionedTextDocumentIdentifier,
    WorkspaceClientCapabilities,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use glicol_ide_config::{ServerLaunch, TraceLevel};

use crate::errors::ClientError;
use crate::messaging;
use crate::options::ClientOptions;
use crate::protocol::RequestIdSequence;
use crate::state::{RunningSession, SessionState};
use crate::trace::ProtocolTrace;
use crate::transport::StdioTransport;
use crate::uri::uri_scheme;
use crate::watcher::SettingsWatcher;

/// Log target for client lifecycle operations.
const CLIENT_TARGET: &str = "glicol_ide_client::client";

/// Grace period before a lingering server process is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Editor-side language client managing one Glicol server session.
pub struct LanguageClient {
    shared: Arc<ClientShared>,
}

/// State shared between the client handle and the settings watcher.
pub(crate) struct ClientShared {
    options: ClientOptions,
    trace: ProtocolTrace,
    ids: RequestIdSequence,
    state: Mutex<SessionState>,
}

impl LanguageClient {
    /// Creates a client for the given options; no process is spawned yet.
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        let trace = ProtocolTrace::new(options.trace_channel.clone(), options.trace);
        Self {
            shared: Arc::new(ClientShared {
                options,
                trace,
                ids: RequestIdSequence::new(),
                state: Mutex::new(SessionState::NotStarted),
            }),
        }
    }

    /// Stable identifier of the session.
    #[must_use]
    pub fn id(&self) -> &str {
        self.shared.options.id.as_str()
    }

    /// Starts the session: spawns the server, runs the initialize
    /// handshake, and installs the settings watcher when a workspace root
    /// is configured.
    ///
    /// # Errors
    ///
    /// Fails when the session is already running or has been stopped (a
    /// stopped session is terminal), when the executable cannot be
    /// spawned, or when the handshake fails. After a handshake failure the
    /// spawned process is terminated and the session is left stopped.
    pub fn start(&self) -> Result<(), ClientError> {
        let launch = self.shared.options.active_launch().clone();
        {
            let mut state = self.shared.lock_state();
            match &*state {
                SessionState::NotStarted => {}
                SessionState::Running(_) => return Err(ClientError::AlreadyRunning),
                SessionState::Stopped => return Err(ClientError::SessionStopped),
            }
            let (child, transport) = spawn_server(&launch)?;
            *state = SessionState::Running(RunningSession {
                child,
                transport,
                watcher: None,
                open_documents: HashSet::new(),
            });
        }

        if let Err(error) = self.handshake() {
            warn!(
                target: CLIENT_TARGET,
                %error,
                "initialize handshake failed; terminating server"
            );
            self.abort_session();
            return Err(error);
        }

        if self.shared.options.trace.is_enabled() {
            let params = SetTraceParams {
                value: trace_value(self.shared.options.trace),
            };
            if let Err(error) = self.shared.notify("$/setTrace", params) {
                debug!(target: CLIENT_TARGET, %error, "failed to send $/setTrace");
            }
        }

        if let Some(root) = &self.shared.options.workspace_root {
            let pattern = self.shared.options.watch_pattern.clone();
            match SettingsWatcher::spawn(root, pattern, Arc::downgrade(&self.shared)) {
                Ok(watcher) => {
                    let mut state = self.shared.lock_state();
                    if let SessionState::Running(session) = &mut *state {
                        session.watcher = Some(watcher);
                    }
                }
                Err(error) => {
                    warn!(target: CLIENT_TARGET, %error, "settings watcher unavailable");
                }
            }
        }

        Ok(())
    }

    /// Stops the session.
    ///
    /// Idempotent: stopping a never-started or already-stopped client does
    /// nothing and succeeds. A running session is asked to shut down
    /// (`shutdown` request, then `exit` notification; failures are logged,
    /// not propagated) and the process is given a short grace period
    /// before being killed.
    pub fn stop(&self) -> Result<(), ClientError> {
        let session = {
            let mut state = self.shared.lock_state();
            match std::mem::replace(&mut *state, SessionState::Stopped) {
                SessionState::Running(session) => session,
                SessionState::NotStarted => {
                    *state = SessionState::NotStarted;
                    return Ok(());
                }
                SessionState::Stopped => return Ok(()),
            }
        };

        let RunningSession {
            mut child,
            mut transport,
            watcher,
            ..
        } = session;

        // Uninstall the watcher first so nothing writes during teardown.
        drop(watcher);

        let shutdown_id = self.shared.ids.next_id();
        if let Err(error) =
            messaging::send_request_raw(&mut transport, &self.shared.trace, shutdown_id, "shutdown", ())
        {
            debug!(target: CLIENT_TARGET, %error, "shutdown request failed");
        }
        if let Err(error) = messaging::send_notification(&mut transport, &self.shared.trace, "exit", ())
        {
            debug!(target: CLIENT_TARGET, %error, "exit notification failed");
        }

        // Closing the transport closes the server's stdin.
        drop(transport);

        terminate_child(&mut child);
        Ok(())
    }

    /// Whether a server session is currently live.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(&*self.shared.lock_state(), SessionState::Running(_))
    }

    /// Notifies the server that a document has been opened.
    ///
    /// Documents outside the selector are not forwarded; the return value
    /// reports whether the notification was sent.
    pub fn did_open(
        &self,
        uri: Uri,
        language_id: &str,
        version: i32,
        text: impl Into<String>,
    ) -> Result<bool, ClientError> {
        let scheme = uri_scheme(&uri).unwrap_or_default();
        if !self.shared.options.selector.matches(&scheme, language_id) {
            debug!(
                target: CLIENT_TARGET,
                uri = %uri.as_str(),
                language = language_id,
                "document outside selector; not forwarded"
            );
            return Ok(false);
        }

        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: language_id.to_string(),
                version,
                text: text.into(),
            },
        };
        self.shared.with_running(|session| {
            messaging::send_notification(
                &mut session.transport,
                &self.shared.trace,
                "textDocument/didOpen",
                params,
            )?;
            session.open_documents.insert(uri);
            Ok(())
        })?;
        Ok(true)
    }

    /// Notifies the server that an open document has changed.
    ///
    /// Sends the full text; documents that were never opened with the
    /// server are skipped.
    pub fn did_change(
        &self,
        uri: Uri,
        version: i32,
        text: impl Into<String>,
    ) -> Result<bool, ClientError> {
        let text = text.into();
        self.shared.with_running(|session| {
            if !session.open_documents.contains(&uri) {
                debug!(
                    target: CLIENT_TARGET,
                    uri = %uri.as_str(),
                    "change for document that was never opened; not forwarded"
                );
                return Ok(false);
            }
            let params = DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier { uri, version },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text,
                }],
            };
            messaging::send_notification(
                &mut session.transport,
                &self.shared.trace,
                "textDocument/didChange",
                params,
            )?;
            Ok(true)
        })
    }

    /// Notifies the server that an open document has been closed.
    pub fn did_close(&self, uri: Uri) -> Result<bool, ClientError> {
        self.shared.with_running(|session| {
            if !session.open_documents.remove(&uri) {
                return Ok(false);
            }
            let params = DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier { uri },
            };
            messaging::send_notification(
                &mut session.transport,
                &self.shared.trace,
                "textDocument/didClose",
                params,
            )?;
            Ok(true)
        })
    }

    fn handshake(&self) -> Result<(), ClientError> {
        let params = initialize_params(&self.shared.options);
        let result: InitializeResult = self.shared.request("initialize", params)?;
        if let Some(info) = result.server_info {
            debug!(
                target: CLIENT_TARGET,
                server = %info.name,
                version = ?info.version,
                "language server initialized"
            );
        }
        self.shared.notify("initialized", InitializedParams {})?;
        Ok(())
    }

    /// Terminates the session after a failed handshake.
    fn abort_session(&self) {
        let mut state = self.shared.lock_state();
        if let SessionState::Running(session) = std::mem::replace(&mut *state, SessionState::Stopped)
        {
            let RunningSession { mut child, .. } = session;
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl std::fmt::Debug for LanguageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state_desc = match &*self.shared.lock_state() {
            SessionState::NotStarted => "not_started".to_string(),
            SessionState::Running(session) => format!("running (pid: {})", session.child.id()),
            SessionState::Stopped => "stopped".to_string(),
        };
        f.debug_struct("LanguageClient")
            .field("id", &self.shared.options.id)
            .field("state", &state_desc)
            .finish()
    }
}

impl ClientShared {
    /// Locks the session state, recovering from poisoning so teardown can
    /// still run after a panic.
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn with_running<T>(
        &self,
        f: impl FnOnce(&mut RunningSession) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let mut state = self.lock_state();
        match &mut *state {
            SessionState::Running(session) => f(session),
            SessionState::NotStarted | SessionState::Stopped => Err(ClientError::NotRunning),
        }
    }

    fn request<P, Res>(&self, method: &str, params: P) -> Result<Res, ClientError>
    where
        P: Serialize,
        Res: DeserializeOwned,
    {
        let id = self.ids.next_id();
        self.with_running(|session| {
            messaging::send_request(&mut session.transport, &self.trace, id, method, params)
        })
    }

    fn notify<P>(&self, method: &str, params: P) -> Result<(), ClientError>
    where
        P: Serialize,
    {
        self.with_running(|session| {
            messaging::send_notification(&mut session.transport, &self.trace, method, params)
        })
    }

    /// Forwards watched-file changes to the server.
    pub(crate) fn notify_watched_files(&self, changes: Vec<FileEvent>) -> Result<(), ClientError> {
        let params = DidChangeWatchedFilesParams { changes };
        self.notify("workspace/didChangeWatchedFiles", params)
    }
}

impl Drop for ClientShared {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(|poison| poison.into_inner());
        if let SessionState::Running(session) = std::mem::replace(state, SessionState::Stopped) {
            let RunningSession { mut child, .. } = session;
            if let Err(error) = child.kill() {
                warn!(
                    target: CLIENT_TARGET,
                    %error,
                    "failed to kill language server process on drop"
                );
            } else {
                let _ = child.wait();
            }
        }
    }
}

/// Spawns the server process described by the launch descriptor.
fn spawn_server(launch: &ServerLaunch) -> Result<(Child, StdioTransport), ClientError> {
    debug!(
        target: CLIENT_TARGET,
        command = %launch.command.display(),
        args = ?launch.args,
        "spawning language server process"
    );

    let mut command = Command::new(&launch.command);
    command
        .args(&launch.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    // The child inherits the ambient environment; overrides are layered on
    // top without clearing anything.
    for (key, value) in &launch.env_overrides {
        command.env(key, value);
    }

    if let Some(dir) = &launch.working_dir {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ClientError::BinaryNotFound {
                command: launch.command.display().to_string(),
                source: e,
            }
        } else {
            ClientError::SpawnFailed {
                message: format!("failed to start {}", launch.command.display()),
                source: e,
            }
        }
    })?;

    let stdin = child.stdin.take().ok_or_else(|| ClientError::SpawnFailed {
        message: "failed to capture stdin".to_string(),
        source: io::Error::other("no stdin"),
    })?;
    let stdout = child.stdout.take().ok_or_else(|| ClientError::SpawnFailed {
        message: "failed to capture stdout".to_string(),
        source: io::Error::other("no stdout"),
    })?;

    debug!(
        target: CLIENT_TARGET,
        pid = child.id(),
        "language server process spawned"
    );

    Ok((child, StdioTransport::new(stdout, stdin)))
}

/// Initialize parameters advertised to the server.
fn initialize_params(options: &ClientOptions) -> InitializeParams {
    InitializeParams {
        process_id: Some(std::process::id()),
        capabilities: ClientCapabilities {
            workspace: Some(WorkspaceClientCapabilities {
                did_change_watched_files: Some(DidChangeWatchedFilesClientCapabilities {
                    dynamic_registration: Some(false),
                    relative_pattern_support: Some(false),
                }),
                ..Default::default()
            }),
            text_document: Some(TextDocumentClientCapabilities::default()),
            ..Default::default()
        },
        trace: Some(trace_value(options.trace)),
        ..Default::default()
    }
}

fn trace_value(level: TraceLevel) -> TraceValue {
    match level {
        TraceLevel::Off => TraceValue::Off,
        TraceLevel::Messages => TraceValue::Messages,
        TraceLevel::Verbose => TraceValue::Verbose,
    }
}

/// Waits for the child to exit, killing it after the grace period.
fn terminate_child(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(target: CLIENT_TARGET, ?status, "language server exited");
        }
        Ok(None) => wait_then_kill(child),
        Err(error) => {
            warn!(
                target: CLIENT_TARGET,
                %error,
                "failed to check process status, waiting before killing"
            );
            wait_then_kill(child);
        }
    }
}

fn wait_then_kill(child: &mut Child) {
    thread::sleep(SHUTDOWN_GRACE);
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(
                target: CLIENT_TARGET,
                ?status,
                "language server exited during grace period"
            );
        }
        Ok(None) | Err(_) => {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
