//! Path to URI conversion for watched files.
//!
//! Uses the `url` crate for percent-encoding and platform-specific path
//! handling, then re-parses into the `lsp-types` URI representation.

use std::path::Path;

use lsp_types::Uri;
use url::Url;

use crate::errors::ClientError;

/// Converts an absolute file path to a `file://` URI.
pub(crate) fn file_uri(path: &Path) -> Result<Uri, ClientError> {
    let url = Url::from_file_path(path).map_err(|()| ClientError::InvalidPath {
        path: path.display().to_string(),
    })?;
    url.as_str().parse().map_err(|_| ClientError::InvalidPath {
        path: path.display().to_string(),
    })
}

/// Extracts the scheme of a document URI, when one is present.
pub(crate) fn uri_scheme(uri: &Uri) -> Option<String> {
    Url::parse(uri.as_str())
        .ok()
        .map(|url| url.scheme().to_string())
}
