//! Host-facing lifecycle entry points.
//!
//! The host loads the extension and invokes [`activate`] once per editor
//! session, then [`deactivate`] on unload. Activation resolves the server
//! launch from the environment, creates the trace output channel, and
//! requests the client start without waiting for the server handshake;
//! deactivation tears the single stored session down and is a safe no-op
//! when nothing was started.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, info};

use glicol_ide_client::{ClientError, ClientOptions, LanguageClient, OutputChannel, TracingOutputChannel};
use glicol_ide_config::{Config, ConfigError, TRACE_CHANNEL_NAME};

use crate::session::{ActiveSession, ClientSession};
use crate::telemetry::{self, TelemetryError};

/// Log target for extension lifecycle operations.
const EXTENSION_TARGET: &str = "glicol_ide_extension";

type ChannelFactory = Box<dyn Fn(&str) -> Arc<dyn OutputChannel> + Send + Sync>;

/// Host context handed to activation.
///
/// Only the workspace root and the output-channel factory are inspected;
/// nothing else about the host context matters to this integration.
pub struct ExtensionContext {
    workspace_root: Option<PathBuf>,
    channel_factory: ChannelFactory,
}

impl ExtensionContext {
    /// Context without a workspace root; trace output is routed through
    /// the `tracing` stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workspace_root: None,
            channel_factory: Box::new(|name| Arc::new(TracingOutputChannel::new(name))),
        }
    }

    /// Sets the workspace root observed for settings-file changes.
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Replaces the factory producing UI-visible output channels.
    #[must_use]
    pub fn with_channel_factory(
        mut self,
        factory: impl Fn(&str) -> Arc<dyn OutputChannel> + Send + Sync + 'static,
    ) -> Self {
        self.channel_factory = Box::new(factory);
        self
    }

    fn create_channel(&self, name: &str) -> Arc<dyn OutputChannel> {
        (self.channel_factory)(name)
    }
}

impl Default for ExtensionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome reported by deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deactivation {
    /// No session had been started; nothing was done.
    NeverStarted,
    /// The stored session was shut down.
    Stopped,
}

/// Errors surfaced by the lifecycle entry points.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// Activation was requested while a session is already active.
    ///
    /// The existing session keeps running; the caller decides whether to
    /// deactivate first.
    #[error("extension is already active")]
    AlreadyActive,

    /// The environment carried unusable configuration.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// Telemetry could not be initialised.
    #[error("telemetry initialisation failed: {0}")]
    Telemetry(#[from] TelemetryError),

    /// Stopping the session failed.
    #[error("failed to stop language client: {0}")]
    Stop(#[from] ClientError),
}

/// Extension instance owning the single session slot.
///
/// The host-facing [`activate`]/[`deactivate`] free functions delegate to
/// a process-wide instance; the type itself is instantiable so tests can
/// run isolated lifecycles.
pub struct Extension {
    slot: Mutex<Option<ActiveSession>>,
}

impl Extension {
    /// Creates an extension with an empty session slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Activates the extension for this editor session.
    ///
    /// Resolves configuration from the environment, initialises telemetry,
    /// builds the language client, and requests its start on a background
    /// thread. Returns once the start has been requested; it does not wait
    /// for the server to become ready. Spawn and handshake failures
    /// surface through the client's own error reporting, not here.
    ///
    /// # Errors
    ///
    /// Fails when a session is already active or when the environment
    /// carries unusable configuration.
    pub fn activate(&self, context: &ExtensionContext) -> Result<(), ExtensionError> {
        let config = Config::from_env()?;
        telemetry::initialise(&config)?;
        self.activate_with(context, &config, |options| {
            Arc::new(LanguageClient::new(options))
        })
    }

    /// Activation seam taking a session constructor.
    ///
    /// [`Extension::activate`] passes the real client constructor; tests
    /// inject recording doubles to assert lifecycle behaviour.
    pub fn activate_with(
        &self,
        context: &ExtensionContext,
        config: &Config,
        build: impl FnOnce(ClientOptions) -> Arc<dyn ClientSession>,
    ) -> Result<(), ExtensionError> {
        let mut slot = self.lock_slot();
        if slot.is_some() {
            return Err(ExtensionError::AlreadyActive);
        }

        let channel = context.create_channel(TRACE_CHANNEL_NAME);
        let mut options =
            ClientOptions::glicol(config.launch_variants()).with_trace(config.trace, channel);
        if let Some(root) = &context.workspace_root {
            options = options.with_workspace_root(root.clone());
        }

        info!(
            target: EXTENSION_TARGET,
            command = %options.active_launch().command.display(),
            "activating glicol language client"
        );

        let session = build(options);
        *slot = Some(ActiveSession::spawn(session));
        Ok(())
    }

    /// Deactivates the extension.
    ///
    /// With no stored session this reports [`Deactivation::NeverStarted`]
    /// and never fails; otherwise the session is taken out of the slot,
    /// the pending start is awaited, and the client is asked to stop so
    /// the host can unload cleanly. A second call observes the empty slot.
    pub fn deactivate(&self) -> Result<Deactivation, ExtensionError> {
        let taken = self.lock_slot().take();
        let Some(active) = taken else {
            debug!(target: EXTENSION_TARGET, "deactivation with no active session");
            return Ok(Deactivation::NeverStarted);
        };

        active.shut_down()?;
        info!(target: EXTENSION_TARGET, "glicol language client stopped");
        Ok(Deactivation::Stopped)
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.slot.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Default for Extension {
    fn default() -> Self {
        Self::new()
    }
}

fn global() -> &'static Extension {
    static INSTANCE: OnceCell<Extension> = OnceCell::new();
    INSTANCE.get_or_init(Extension::new)
}

/// Host entry point: activates the extension for this editor session.
pub fn activate(context: &ExtensionContext) -> Result<(), ExtensionError> {
    global().activate(context)
}

/// Host entry point: deactivates the extension on unload.
pub fn deactivate() -> Result<Deactivation, ExtensionError> {
    global().deactivate()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use glicol_ide_client::MemoryOutputChannel;
    use glicol_ide_config::TraceLevel;
    use rstest::rstest;

    use super::*;

    /// Records lifecycle calls routed through the session seam.
    struct RecordingSession {
        events: Arc<StdMutex<Vec<&'static str>>>,
        fail_start: bool,
    }

    impl RecordingSession {
        fn new(events: Arc<StdMutex<Vec<&'static str>>>) -> Self {
            Self {
                events,
                fail_start: false,
            }
        }

        fn failing_start(events: Arc<StdMutex<Vec<&'static str>>>) -> Self {
            Self {
                events,
                fail_start: true,
            }
        }

        fn record(&self, event: &'static str) {
            self.events
                .lock()
                .unwrap_or_else(|poison| poison.into_inner())
                .push(event);
        }
    }

    impl ClientSession for RecordingSession {
        fn start(&self) -> Result<(), ClientError> {
            self.record("start");
            if self.fail_start {
                return Err(ClientError::NotRunning);
            }
            Ok(())
        }

        fn stop(&self) -> Result<(), ClientError> {
            self.record("stop");
            Ok(())
        }
    }

    fn events() -> Arc<StdMutex<Vec<&'static str>>> {
        Arc::new(StdMutex::new(Vec::new()))
    }

    fn recorded(events: &Arc<StdMutex<Vec<&'static str>>>) -> Vec<&'static str> {
        events
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    #[rstest]
    fn deactivation_before_activation_is_a_no_op() {
        let extension = Extension::new();

        assert_eq!(
            extension.deactivate().expect("deactivate failed"),
            Deactivation::NeverStarted
        );
        assert_eq!(
            extension.deactivate().expect("deactivate failed"),
            Deactivation::NeverStarted
        );
    }

    #[rstest]
    fn activation_then_deactivation_starts_and_stops_once_in_order() {
        let extension = Extension::new();
        let log = events();
        let session_log = log.clone();

        extension
            .activate_with(&ExtensionContext::new(), &Config::default(), move |_| {
                Arc::new(RecordingSession::new(session_log))
            })
            .expect("activate failed");

        assert_eq!(
            extension.deactivate().expect("deactivate failed"),
            Deactivation::Stopped
        );
        assert_eq!(recorded(&log), vec!["start", "stop"]);
    }

    #[rstest]
    fn double_activation_is_rejected_and_keeps_the_first_session() {
        let extension = Extension::new();
        let log = events();
        let session_log = log.clone();

        extension
            .activate_with(&ExtensionContext::new(), &Config::default(), move |_| {
                Arc::new(RecordingSession::new(session_log))
            })
            .expect("activate failed");

        let second_log = events();
        let second_session_log = second_log.clone();
        let error = extension
            .activate_with(&ExtensionContext::new(), &Config::default(), move |_| {
                Arc::new(RecordingSession::new(second_session_log))
            })
            .expect_err("second activation should fail");

        assert!(matches!(error, ExtensionError::AlreadyActive));
        assert!(recorded(&second_log).is_empty());

        assert_eq!(
            extension.deactivate().expect("deactivate failed"),
            Deactivation::Stopped
        );
        assert_eq!(recorded(&log), vec!["start", "stop"]);
    }

    #[rstest]
    fn failed_start_still_deactivates_cleanly() {
        let extension = Extension::new();
        let log = events();
        let session_log = log.clone();

        extension
            .activate_with(&ExtensionContext::new(), &Config::default(), move |_| {
                Arc::new(RecordingSession::failing_start(session_log))
            })
            .expect("activate failed");

        assert_eq!(
            extension.deactivate().expect("deactivate failed"),
            Deactivation::Stopped
        );
        assert_eq!(recorded(&log), vec!["start", "stop"]);
    }

    #[rstest]
    fn reactivation_after_deactivation_is_allowed() {
        let extension = Extension::new();
        let log = events();

        for _ in 0..2 {
            let session_log = log.clone();
            extension
                .activate_with(&ExtensionContext::new(), &Config::default(), move |_| {
                    Arc::new(RecordingSession::new(session_log))
                })
                .expect("activate failed");
            extension.deactivate().expect("deactivate failed");
        }

        assert_eq!(recorded(&log), vec!["start", "stop", "start", "stop"]);
    }

    #[rstest]
    fn client_options_carry_the_fixed_wiring() {
        let extension = Extension::new();
        let context = ExtensionContext::new()
            .with_workspace_root("/workspace")
            .with_channel_factory(|name| Arc::new(MemoryOutputChannel::new(name)));
        let config = Config {
            trace: TraceLevel::Messages,
            ..Config::default()
        };

        let seen = Arc::new(StdMutex::new(None));
        let sink = seen.clone();
        extension
            .activate_with(&context, &config, move |options| {
                let log = events();
                *sink.lock().unwrap_or_else(|poison| poison.into_inner()) = Some((
                    options.id.clone(),
                    options.trace_channel.name().to_string(),
                    options.trace,
                    options.workspace_root.clone(),
                ));
                Arc::new(RecordingSession::new(log))
            })
            .expect("activate failed");
        extension.deactivate().expect("deactivate failed");

        let seen = seen
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
            .expect("options not captured");
        assert_eq!(seen.0, "glicol-language-server");
        assert_eq!(seen.1, "Glicol Language Server trace");
        assert_eq!(seen.2, TraceLevel::Messages);
        assert_eq!(seen.3, Some(PathBuf::from("/workspace")));
    }
}
