//! Configuration for the Glicol editor integration.
//!
//! The crate owns everything the extension and the language client need to
//! agree on before a server process exists: the fixed protocol constants
//! (language identifier, document scheme, settings glob, channel names),
//! launch descriptors for the external `glicol-lsp` process, the document
//! selector, and the logging/trace knobs resolved from the environment.

mod config;
mod defaults;
mod launch;
mod logging;
mod selector;

pub use config::{Config, ConfigError, LOG_FILTER_ENV, LOG_FORMAT_ENV, TRACE_ENV};
pub use defaults::{
    CLIENT_ID, CLIENT_TITLE, DEFAULT_LOG_FILTER, DEFAULT_SERVER_COMMAND, DOCUMENT_SCHEME,
    LANGUAGE_ID, SERVER_LOG_KEY, SERVER_LOG_VALUE, SERVER_PATH_ENV, SETTINGS_WATCH_GLOB,
    TRACE_CHANNEL_NAME, default_log_filter, default_log_filter_string, default_log_format,
};
pub use launch::{LaunchVariants, ServerLaunch};
pub use logging::{LogFormat, LogFormatParseError, TraceLevel};
pub use selector::{DocumentSelector, SettingsWatchPattern, WatchPatternError};
