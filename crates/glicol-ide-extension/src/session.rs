//! Session seam between the extension and the language client.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::warn;

use glicol_ide_client::{ClientError, LanguageClient};

/// Log target for session lifecycle operations.
const SESSION_TARGET: &str = "glicol_ide_extension::session";

/// Behaviour the extension needs from a client session.
///
/// [`LanguageClient`] implements it for real sessions; tests register
/// lightweight doubles so lifecycle behaviour can be asserted without
/// spawning a server process.
pub trait ClientSession: Send + Sync {
    /// Begins the session: spawn the server and run the handshake.
    fn start(&self) -> Result<(), ClientError>;

    /// Ends the session; must be idempotent.
    fn stop(&self) -> Result<(), ClientError>;
}

impl ClientSession for LanguageClient {
    fn start(&self) -> Result<(), ClientError> {
        LanguageClient::start(self)
    }

    fn stop(&self) -> Result<(), ClientError> {
        LanguageClient::stop(self)
    }
}

/// A stored session together with its pending background start.
pub(crate) struct ActiveSession {
    session: Arc<dyn ClientSession>,
    startup: Option<JoinHandle<Result<(), ClientError>>>,
}

impl ActiveSession {
    /// Stores the session and requests its start on a background thread.
    ///
    /// Activation returns to the host without waiting for the server
    /// handshake; start failures surface through the client's own error
    /// reporting and are observed again when the session is shut down.
    pub(crate) fn spawn(session: Arc<dyn ClientSession>) -> Self {
        let startup_session = Arc::clone(&session);
        let startup = thread::Builder::new()
            .name("glicol-ide-activate".to_string())
            .spawn(move || run_startup(&*startup_session));

        let startup = match startup {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(
                    target: SESSION_TARGET,
                    %error,
                    "failed to spawn activation thread; starting synchronously"
                );
                let _ = run_startup(&*session);
                None
            }
        };

        Self { session, startup }
    }

    /// Waits for the pending start to settle, then stops the session.
    pub(crate) fn shut_down(mut self) -> Result<(), ClientError> {
        if let Some(handle) = self.startup.take() {
            match handle.join() {
                Ok(Ok(())) | Ok(Err(_)) => {}
                Err(_) => {
                    warn!(target: SESSION_TARGET, "activation thread panicked");
                }
            }
        }
        self.session.stop()
    }
}

fn run_startup(session: &dyn ClientSession) -> Result<(), ClientError> {
    let outcome = session.start();
    if let Err(error) = &outcome {
        warn!(target: SESSION_TARGET, %error, "language client failed to start");
    }
    outcome
}
