//! Options assembled by the extension for a client session.

use std::path::PathBuf;
use std::sync::Arc;

use glicol_ide_config::{
    CLIENT_ID, CLIENT_TITLE, DocumentSelector, LaunchVariants, ServerLaunch, SettingsWatchPattern,
    TRACE_CHANNEL_NAME, TraceLevel,
};

use crate::trace::{OutputChannel, TracingOutputChannel};

/// Configuration for a [`LanguageClient`](crate::LanguageClient) session.
#[derive(Clone)]
pub struct ClientOptions {
    /// Stable identifier for the session.
    pub id: String,
    /// Human-readable session title.
    pub title: String,
    /// Run and debug launch descriptors.
    pub launch: LaunchVariants,
    /// Whether the host runs the extension under a debugger.
    pub debug_mode: bool,
    /// Documents the client handles.
    pub selector: DocumentSelector,
    /// Workspace root observed for settings changes; `None` disables
    /// watching.
    pub workspace_root: Option<PathBuf>,
    /// Glob selecting the watched settings file.
    pub watch_pattern: SettingsWatchPattern,
    /// Protocol trace verbosity.
    pub trace: TraceLevel,
    /// Channel receiving protocol trace output.
    pub trace_channel: Arc<dyn OutputChannel>,
}

impl ClientOptions {
    /// Options for the standard Glicol session.
    #[must_use]
    pub fn glicol(launch: LaunchVariants) -> Self {
        Self {
            id: CLIENT_ID.to_string(),
            title: CLIENT_TITLE.to_string(),
            launch,
            debug_mode: false,
            selector: DocumentSelector::glicol(),
            workspace_root: None,
            watch_pattern: SettingsWatchPattern::default(),
            trace: TraceLevel::Off,
            trace_channel: Arc::new(TracingOutputChannel::new(TRACE_CHANNEL_NAME)),
        }
    }

    /// Enables settings watching under the given workspace root.
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Directs protocol tracing to the given channel at the given level.
    #[must_use]
    pub fn with_trace(mut self, level: TraceLevel, channel: Arc<dyn OutputChannel>) -> Self {
        self.trace = level;
        self.trace_channel = channel;
        self
    }

    /// Marks the session as running under the host's debugger.
    #[must_use]
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Launch descriptor for the current mode.
    #[must_use]
    pub fn active_launch(&self) -> &ServerLaunch {
        if self.debug_mode {
            &self.launch.debug
        } else {
            &self.launch.run
        }
    }
}
