//! Protocol trace output for the language client session.
//!
//! The host exposes named, UI-visible log sinks; the client mirrors its
//! protocol traffic into one of them according to the configured
//! [`TraceLevel`]. Hosts provide their own [`OutputChannel`] implementation;
//! [`TracingOutputChannel`] routes lines through `tracing` for headless
//! hosts and [`MemoryOutputChannel`] records them for tests.

use std::sync::{Arc, Mutex};

use glicol_ide_config::TraceLevel;

/// Log target for trace channel output.
const TRACE_TARGET: &str = "glicol_ide_client::trace";

/// A named, line-oriented log sink visible in the host's UI.
pub trait OutputChannel: Send + Sync {
    /// The channel name shown to the user.
    fn name(&self) -> &str;

    /// Appends one line to the channel.
    fn append_line(&self, line: &str);
}

/// Output channel that forwards lines through the `tracing` stack.
pub struct TracingOutputChannel {
    name: String,
}

impl TracingOutputChannel {
    /// Creates a channel with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl OutputChannel for TracingOutputChannel {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn append_line(&self, line: &str) {
        tracing::info!(target: TRACE_TARGET, channel = %self.name, "{line}");
    }
}

/// Output channel that records lines in memory.
#[derive(Default)]
pub struct MemoryOutputChannel {
    name: String,
    lines: Mutex<Vec<String>>,
}

impl MemoryOutputChannel {
    /// Creates a recording channel with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of every line appended so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

impl OutputChannel for MemoryOutputChannel {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn append_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(line.to_string());
    }
}

/// Couples an output channel with a trace verbosity.
#[derive(Clone)]
pub struct ProtocolTrace {
    channel: Arc<dyn OutputChannel>,
    level: TraceLevel,
}

impl ProtocolTrace {
    /// Creates a trace writing to the given channel at the given level.
    #[must_use]
    pub fn new(channel: Arc<dyn OutputChannel>, level: TraceLevel) -> Self {
        Self { channel, level }
    }

    /// A trace that produces no output.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            channel: Arc::new(TracingOutputChannel::new("disabled")),
            level: TraceLevel::Off,
        }
    }

    /// The configured verbosity.
    #[must_use]
    pub fn level(&self) -> TraceLevel {
        self.level
    }

    /// Records a request sent to the server.
    pub fn sent_request(&self, method: &str, id: i64, payload: &[u8]) {
        self.frame(format!("sending request '{method}' (id {id})"), payload);
    }

    /// Records a notification sent to the server.
    pub fn sent_notification(&self, method: &str, payload: &[u8]) {
        self.frame(format!("sending notification '{method}'"), payload);
    }

    /// Records a response received from the server.
    pub fn received_response(&self, id: Option<i64>, payload: &[u8]) {
        let summary = match id {
            Some(id) => format!("received response (id {id})"),
            None => String::from("received response (no id)"),
        };
        self.frame(summary, payload);
    }

    /// Records a server-initiated request.
    pub fn received_request(&self, method: &str, id: i64, payload: &[u8]) {
        self.frame(format!("received request '{method}' (id {id})"), payload);
    }

    /// Records a server-initiated notification.
    pub fn received_notification(&self, method: &str, payload: &[u8]) {
        self.frame(format!("received notification '{method}'"), payload);
    }

    fn frame(&self, summary: String, payload: &[u8]) {
        if !self.level.is_enabled() {
            return;
        }
        self.channel.append_line(&summary);
        if self.level.includes_payloads() {
            self.channel
                .append_line(&String::from_utf8_lossy(payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn recording(level: TraceLevel) -> (Arc<MemoryOutputChannel>, ProtocolTrace) {
        let channel = Arc::new(MemoryOutputChannel::new("test trace"));
        let trace = ProtocolTrace::new(channel.clone(), level);
        (channel, trace)
    }

    #[rstest]
    fn off_level_writes_nothing() {
        let (channel, trace) = recording(TraceLevel::Off);

        trace.sent_request("initialize", 1, b"{}");
        trace.received_notification("window/logMessage", b"{}");

        assert!(channel.lines().is_empty());
    }

    #[rstest]
    fn messages_level_writes_summaries_only() {
        let (channel, trace) = recording(TraceLevel::Messages);

        trace.sent_request("initialize", 1, br#"{"id":1}"#);

        assert_eq!(channel.lines(), vec!["sending request 'initialize' (id 1)"]);
    }

    #[rstest]
    fn verbose_level_includes_payloads() {
        let (channel, trace) = recording(TraceLevel::Verbose);

        trace.sent_notification("initialized", br#"{"method":"initialized"}"#);

        assert_eq!(
            channel.lines(),
            vec![
                "sending notification 'initialized'".to_string(),
                r#"{"method":"initialized"}"#.to_string(),
            ]
        );
    }

    #[rstest]
    fn response_summary_reports_missing_id() {
        let (channel, trace) = recording(TraceLevel::Messages);

        trace.received_response(None, b"{}");

        assert_eq!(channel.lines(), vec!["received response (no id)"]);
    }

    #[rstest]
    fn memory_channel_keeps_its_name() {
        let channel = MemoryOutputChannel::new("Glicol Language Server trace");

        assert_eq!(channel.name(), "Glicol Language Server trace");
    }
}
