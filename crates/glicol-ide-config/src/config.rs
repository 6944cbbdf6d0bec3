//! Extension configuration resolved from the process environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::defaults::{DEFAULT_SERVER_COMMAND, SERVER_PATH_ENV, default_log_filter_string};
use crate::launch::{LaunchVariants, ServerLaunch};
use crate::logging::{LogFormat, TraceLevel};

/// Environment variable selecting the extension's own log filter.
pub const LOG_FILTER_ENV: &str = "GLICOL_IDE_LOG";

/// Environment variable selecting the extension's own log format.
pub const LOG_FORMAT_ENV: &str = "GLICOL_IDE_LOG_FORMAT";

/// Environment variable selecting the protocol trace level.
pub const TRACE_ENV: &str = "GLICOL_IDE_TRACE";

/// Runtime configuration for the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Filter expression applied to the extension's own logging.
    pub log_filter: String,
    /// Output format for the extension's own logging.
    pub log_format: LogFormat,
    /// Protocol trace verbosity for the language client session.
    pub trace: TraceLevel,
    /// Optional override for the server executable path.
    pub server_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: LogFormat::default(),
            trace: TraceLevel::default(),
            server_path: None,
        }
    }
}

impl Config {
    /// Resolves configuration from the ambient process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary variable lookup.
    ///
    /// Unset variables fall back to the defaults; set-but-unparseable
    /// values are rejected rather than silently ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            config.log_filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.log_format = LogFormat::from_str(&format)
                .map_err(|_| ConfigError::InvalidLogFormat { value: format })?;
        }
        if let Some(trace) = lookup(TRACE_ENV) {
            config.trace = TraceLevel::from_str(&trace)
                .map_err(|_| ConfigError::InvalidTraceLevel { value: trace })?;
        }
        config.server_path = lookup(SERVER_PATH_ENV).map(PathBuf::from);
        Ok(config)
    }

    /// Launch descriptor honouring the configured executable override.
    ///
    /// An override is used verbatim as the spawned command; otherwise the
    /// fixed default name is resolved through `PATH`.
    #[must_use]
    pub fn server_launch(&self) -> ServerLaunch {
        match &self.server_path {
            Some(path) => ServerLaunch::from_command(path.clone()),
            None => ServerLaunch::from_command(DEFAULT_SERVER_COMMAND),
        }
    }

    /// Run and debug launch descriptors for the client session.
    #[must_use]
    pub fn launch_variants(&self) -> LaunchVariants {
        LaunchVariants::identical(self.server_launch())
    }
}

/// Errors raised while resolving configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured log format is not recognised.
    #[error("unsupported log format '{value}'")]
    InvalidLogFormat {
        /// Value found in the environment.
        value: String,
    },

    /// The configured trace level is not recognised.
    #[error("unsupported trace level '{value}'")]
    InvalidTraceLevel {
        /// Value found in the environment.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[rstest]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(|_| None).expect("load failed");

        assert_eq!(config, Config::default());
        assert_eq!(config.log_filter, "info");
    }

    #[rstest]
    fn server_path_override_is_used_verbatim() {
        let lookup = lookup_from(&[("SERVER_PATH", "/opt/glicol/bin/glicol-lsp")]);
        let config = Config::from_lookup(lookup).expect("load failed");

        assert_eq!(
            config.server_launch().command,
            PathBuf::from("/opt/glicol/bin/glicol-lsp")
        );
    }

    #[rstest]
    fn missing_override_falls_back_to_default_command() {
        let config = Config::from_lookup(|_| None).expect("load failed");

        assert_eq!(config.server_launch().command, PathBuf::from("glicol-lsp"));
    }

    #[rstest]
    fn log_and_trace_settings_are_parsed() {
        let lookup = lookup_from(&[
            ("GLICOL_IDE_LOG", "glicol_ide_client=debug"),
            ("GLICOL_IDE_LOG_FORMAT", "compact"),
            ("GLICOL_IDE_TRACE", "verbose"),
        ]);
        let config = Config::from_lookup(lookup).expect("load failed");

        assert_eq!(config.log_filter, "glicol_ide_client=debug");
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.trace, TraceLevel::Verbose);
    }

    #[rstest]
    fn invalid_log_format_is_rejected() {
        let lookup = lookup_from(&[("GLICOL_IDE_LOG_FORMAT", "yaml")]);
        let error = Config::from_lookup(lookup).expect_err("load should fail");

        assert_eq!(
            error,
            ConfigError::InvalidLogFormat {
                value: String::from("yaml")
            }
        );
    }

    #[rstest]
    fn invalid_trace_level_is_rejected() {
        let lookup = lookup_from(&[("GLICOL_IDE_TRACE", "loud")]);
        let error = Config::from_lookup(lookup).expect_err("load should fail");

        assert_eq!(
            error,
            ConfigError::InvalidTraceLevel {
                value: String::from("loud")
            }
        );
    }

    #[rstest]
    fn launch_variants_share_the_resolved_command() {
        let lookup = lookup_from(&[("SERVER_PATH", "custom-lsp")]);
        let variants = Config::from_lookup(lookup)
            .expect("load failed")
            .launch_variants();

        assert_eq!(variants.run, variants.debug);
        assert_eq!(variants.run.command, PathBuf::from("custom-lsp"));
    }
}
