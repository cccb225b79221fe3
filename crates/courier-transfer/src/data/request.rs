use std::path::PathBuf;

use crate::error::{Result, TransferError};

/// Fetch `url` into `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url:         String,
    pub destination: PathBuf,
    pub overwrite:   bool,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url:         url.into(),
            destination: destination.into(),
            overwrite:   false,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Reject blank inputs before any network or filesystem work.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(TransferError::InvalidInput("download URL is required".into()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(TransferError::InvalidInput("output path is required".into()));
        }
        Ok(())
    }
}

/// Push the local `file` to a remote asset record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: PathBuf,
}

impl UploadRequest {
    pub fn new(file: impl Into<PathBuf>) -> Self { Self { file: file.into() } }

    pub fn validate(&self) -> Result<()> {
        if self.file.as_os_str().is_empty() {
            return Err(TransferError::InvalidInput("upload path is required".into()));
        }
        Ok(())
    }
}

/// A single transfer in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRequest {
    Download(DownloadRequest),
    Upload(UploadRequest),
}

impl TransferRequest {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Download(request) => request.validate(),
            Self::Upload(request) => request.validate(),
        }
    }
}

impl From<DownloadRequest> for TransferRequest {
    fn from(request: DownloadRequest) -> Self { Self::Download(request) }
}

impl From<UploadRequest> for TransferRequest {
    fn from(request: UploadRequest) -> Self { Self::Upload(request) }
}
