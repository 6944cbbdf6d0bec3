//! Document selection and settings-file watch predicates.

use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;

use crate::defaults::{DOCUMENT_SCHEME, LANGUAGE_ID, SETTINGS_WATCH_GLOB};

/// Predicate describing which host documents the client handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSelector {
    /// URI scheme a document must use.
    pub scheme: String,
    /// Language identifier assigned by the host's language detection.
    pub language: String,
}

impl DocumentSelector {
    /// Selector for Glicol documents on the `file` scheme.
    #[must_use]
    pub fn glicol() -> Self {
        Self {
            scheme: DOCUMENT_SCHEME.to_string(),
            language: LANGUAGE_ID.to_string(),
        }
    }

    /// Whether a document with the given scheme and language is handled.
    #[must_use]
    pub fn matches(&self, scheme: &str, language_id: &str) -> bool {
        self.scheme == scheme && self.language == language_id
    }
}

impl Default for DocumentSelector {
    fn default() -> Self {
        Self::glicol()
    }
}

/// Errors raised when compiling a watch pattern.
#[derive(Debug, Error)]
#[error("invalid watch pattern '{pattern}': {source}")]
pub struct WatchPatternError {
    /// Pattern that failed to compile.
    pattern: String,
    #[source]
    source: globset::Error,
}

impl WatchPatternError {
    /// Returns the pattern that failed to compile.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Compiled glob selecting the workspace settings file.
#[derive(Debug, Clone)]
pub struct SettingsWatchPattern {
    pattern: String,
    matcher: GlobMatcher,
}

impl SettingsWatchPattern {
    /// Compiles a glob pattern into a watch predicate.
    ///
    /// Path separators are matched literally so the final component of the
    /// pattern only matches whole file names.
    pub fn new(pattern: impl Into<String>) -> Result<Self, WatchPatternError> {
        let pattern = pattern.into();
        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| WatchPatternError {
                pattern: pattern.clone(),
                source,
            })?;
        Ok(Self {
            matcher: glob.compile_matcher(),
            pattern,
        })
    }

    /// The glob pattern in textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether the path refers to the watched settings file.
    #[must_use]
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        self.matcher.is_match(path.as_ref())
    }
}

impl Default for SettingsWatchPattern {
    fn default() -> Self {
        Self::new(SETTINGS_WATCH_GLOB).expect("default watch pattern must compile")
    }
}
