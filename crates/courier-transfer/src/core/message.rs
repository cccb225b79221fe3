use http::StatusCode;

use crate::data::ErrorDetail;

/// Largest error body, in bytes, that is turned into a message.
pub const ERROR_BODY_LIMIT: usize = 4096;

const UNKNOWN_ERROR: &str = "unknown error";

/// Replace every run of whitespace with a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String { text.split_whitespace().collect::<Vec<_>>().join(" ") }

/// Message for an unsuccessful response.
///
/// The (already truncated) body wins when it has any content; otherwise the
/// status line, e.g. `404 Not Found`, is used.
pub fn status_message(status: u16, body: &[u8]) -> String {
    let body = &body[..body.len().min(ERROR_BODY_LIMIT)];
    let message = collapse_whitespace(&String::from_utf8_lossy(body));
    if !message.is_empty() {
        return message;
    }
    match StatusCode::from_u16(status).ok().and_then(|code| code.canonical_reason()) {
        Some(reason) => format!("{status} {reason}"),
        None => status.to_string(),
    }
}

/// Human-readable summary of the errors attached to a failed delivery.
pub fn format_asset_errors(errors: &[ErrorDetail]) -> String {
    let parts: Vec<String> = errors
        .iter()
        .filter_map(|item| match (item.code.as_str(), item.message.as_str()) {
            ("", "") => None,
            (code, "") => Some(code.to_owned()),
            ("", message) => Some(message.to_owned()),
            (code, message) => Some(format!("{code}: {message}")),
        })
        .collect();

    if parts.is_empty() {
        UNKNOWN_ERROR.to_owned()
    } else {
        parts.join("; ")
    }
}
