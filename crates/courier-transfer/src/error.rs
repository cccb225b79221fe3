//! Error types for courier-transfer.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::is_retryable_status;
use crate::data::DeliveryState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why an operation stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("operation cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

impl std::error::Error for Interrupt {}

/// Coarse bucket an error falls into, used for retry and exit-code decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    HttpStatus,
    TransientNetwork,
    Cancellation,
    FilesystemSafety,
    RemoteProcessingFailed,
    Other,
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("unexpected status {code} ({message})")]
    Status { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[source] BoxError),

    #[error(transparent)]
    Interrupted(#[from] Interrupt),

    #[error(transparent)]
    Fs(#[from] courier_fs::Error),

    #[error("asset {asset_id} delivery failed: {detail}")]
    DeliveryFailed { asset_id: String, detail: String },

    #[error(
        "timed out waiting for asset {asset_id} delivery (last state: {}): {reason}",
        .last_state.as_ref().map_or("none", DeliveryState::as_str)
    )]
    DeliveryTimedOut {
        asset_id:   String,
        last_state: Option<DeliveryState>,
        reason:     Interrupt,
    },

    #[error("remote request failed: {0}")]
    Remote(#[source] BoxError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("file I/O error on {}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    pub fn network(err: impl Into<BoxError>) -> Self { Self::Network(err.into()) }

    pub fn remote(err: impl Into<BoxError>) -> Self { Self::Remote(err.into()) }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Status { .. } => ErrorClass::HttpStatus,
            Self::Network(_) => ErrorClass::TransientNetwork,
            Self::Interrupted(_) | Self::DeliveryTimedOut { .. } => ErrorClass::Cancellation,
            Self::Fs(err) if err.is_safety_violation() => ErrorClass::FilesystemSafety,
            Self::DeliveryFailed { .. } => ErrorClass::RemoteProcessingFailed,
            Self::Fs(_) | Self::Remote(_) | Self::InvalidInput(_) | Self::Io { .. } => ErrorClass::Other,
        }
    }

    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Only transport failures and the statuses in
    /// [`RETRYABLE_STATUS`](crate::core::RETRYABLE_STATUS) qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { code, .. } => is_retryable_status(*code),
            Self::Network(_) => true,
            Self::Interrupted(_)
            | Self::Fs(_)
            | Self::DeliveryFailed { .. }
            | Self::DeliveryTimedOut { .. }
            | Self::Remote(_)
            | Self::InvalidInput(_)
            | Self::Io { .. } => false,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;

/// A download that gave up, with what was learned along the way.
#[derive(Debug, Error)]
#[error("download failed after {attempts} attempt(s): {source}")]
pub struct DownloadError {
    #[source]
    pub source:            TransferError,
    /// Content type of the last response received, if any.
    pub last_content_type: Option<String>,
    pub attempts:          u32,
}

impl DownloadError {
    pub fn class(&self) -> ErrorClass { self.source.class() }
}
