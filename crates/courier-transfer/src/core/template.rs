use std::path::Path;

use url::Url;

use crate::error::{Result, TransferError};

const FALLBACK_FORMAT: &str = "png";

/// Fill in an image template URL such as `https://cdn/{w}x{h}bb.{f}`.
///
/// `{f}` takes the extension of `file_name`, or `png` when it has none.
/// The result must be a fully resolved `http(s)` URL.
pub fn resolve_template_url(template: &str, width: u32, height: u32, file_name: &str) -> Result<String> {
    let template = template.trim();
    if template.is_empty() {
        return Err(invalid("image template URL is missing"));
    }
    if width == 0 || height == 0 {
        return Err(invalid("image dimensions are missing"));
    }

    let mut resolved = template
        .replace("{w}", &width.to_string())
        .replace("{h}", &height.to_string());
    if resolved.contains("{f}") {
        let format = Path::new(file_name.trim())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .unwrap_or(FALLBACK_FORMAT);
        resolved = resolved.replace("{f}", format);
    }

    if resolved.contains(['{', '}']) {
        return Err(invalid(format!("unresolved template URL: {template:?}")));
    }

    let parsed = Url::parse(&resolved).map_err(|e| invalid(format!("invalid resolved URL {resolved:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(resolved),
        other => Err(invalid(format!("unsupported URL scheme {other:?}"))),
    }
}

/// Reduce a server-supplied name to a single safe path component.
///
/// Only the last `/`-separated component is kept and any remaining
/// backslashes become `_`. Returns `None` when nothing usable is left, so
/// callers can fall back to a generated name.
pub fn sanitize_file_name(value: &str) -> Option<String> {
    let base = value
        .trim()
        .rsplit('/')
        .find(|part| !part.trim().is_empty())
        .unwrap_or_default()
        .trim()
        .replace('\\', "_");

    match base.trim() {
        "" | "." | ".." => None,
        name => Some(name.to_owned()),
    }
}

fn invalid(message: impl Into<String>) -> TransferError { TransferError::InvalidInput(message.into()) }
