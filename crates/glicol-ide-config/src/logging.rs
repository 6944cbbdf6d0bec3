use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats for the extension's own telemetry.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Protocol trace verbosity applied to the language client session.
///
/// The values mirror what the `$/setTrace` notification accepts, so the
/// same setting drives the server-side trace and the local trace channel.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TraceLevel {
    /// No protocol tracing.
    #[default]
    Off,
    /// One summary line per protocol message.
    Messages,
    /// Summary lines plus full message payloads.
    Verbose,
}

impl TraceLevel {
    /// Whether any trace output should be produced.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Whether full message payloads should be traced.
    #[must_use]
    pub fn includes_payloads(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("off", TraceLevel::Off)]
    #[case("messages", TraceLevel::Messages)]
    #[case("Verbose", TraceLevel::Verbose)]
    fn parses_trace_levels_case_insensitively(#[case] input: &str, #[case] expected: TraceLevel) {
        assert_eq!(TraceLevel::from_str(input).expect("parse failed"), expected);
    }

    #[rstest]
    fn rejects_unknown_trace_level() {
        assert!(TraceLevel::from_str("chatty").is_err());
    }

    #[rstest]
    fn trace_level_gates() {
        assert!(!TraceLevel::Off.is_enabled());
        assert!(TraceLevel::Messages.is_enabled());
        assert!(!TraceLevel::Messages.includes_payloads());
        assert!(TraceLevel::Verbose.includes_payloads());
    }

    #[rstest]
    fn log_format_round_trips_through_strum() {
        assert_eq!(LogFormat::Json.to_string(), "json");
        assert_eq!(
            LogFormat::from_str("compact").expect("parse failed"),
            LogFormat::Compact
        );
    }
}
