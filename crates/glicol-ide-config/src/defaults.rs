//! Fixed values shared by the extension and the language client.

use crate::logging::LogFormat;

/// Environment variable that overrides the server executable path.
pub const SERVER_PATH_ENV: &str = "SERVER_PATH";

/// Executable name used when no override is present.
pub const DEFAULT_SERVER_COMMAND: &str = "glicol-lsp";

/// Environment key layered onto the spawned server process.
pub const SERVER_LOG_KEY: &str = "RUST_LOG";

/// Verbosity value assigned to [`SERVER_LOG_KEY`] for the spawned server.
pub const SERVER_LOG_VALUE: &str = "debug";

/// URI scheme a document must use to be handled by the client.
pub const DOCUMENT_SCHEME: &str = "file";

/// Language identifier the host assigns to Glicol documents.
pub const LANGUAGE_ID: &str = "glicol";

/// Glob selecting the workspace settings file forwarded to the server.
pub const SETTINGS_WATCH_GLOB: &str = "**/.clientrc";

/// Name of the UI output channel that receives protocol trace lines.
pub const TRACE_CHANNEL_NAME: &str = "Glicol Language Server trace";

/// Stable identifier for the language client session.
pub const CLIENT_ID: &str = "glicol-language-server";

/// Human-readable title for the language client session.
pub const CLIENT_TITLE: &str = "glicol language server";

/// Default log filter expression used by the extension.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the extension.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the extension.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::default()
}
