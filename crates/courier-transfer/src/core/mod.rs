//! Pure helpers: backoff arithmetic, response classification and name handling.
//!
//! Nothing here touches the network or the filesystem.

mod message;
mod retry;
mod template;

pub use message::{ERROR_BODY_LIMIT, collapse_whitespace, format_asset_errors, status_message};
pub use retry::{BACKOFF_FACTOR, RETRYABLE_STATUS, is_retryable_status, retry_delay};
pub use template::{resolve_template_url, sanitize_file_name};
