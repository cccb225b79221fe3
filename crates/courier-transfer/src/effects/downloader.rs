use std::path::Path;

use courier_fs::{AtomicFile, AtomicWriteOptions};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{BoxStream, CancelScope, HttpClient, HttpRequest};
use crate::data::{DownloadRequest, RetryPolicy};
use crate::error::{DownloadError, Result, TransferError};

pub const USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"), " asset-download");

/// What a successful download produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub bytes_written: u64,
    pub content_type:  Option<String>,
    pub attempts:      u32,
}

/// Fetches a URL into a local file with retries and atomic placement.
///
/// Each attempt streams the body straight into an [`AtomicFile`]; a failed
/// attempt drops it, so nothing partial is ever left at the destination.
pub struct Downloader<C: HttpClient> {
    client:        C,
    policy:        RetryPolicy,
    write_options: AtomicWriteOptions,
    user_agent:    String,
}

impl<C: HttpClient> Downloader<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
            write_options: AtomicWriteOptions::default(),
            user_agent: USER_AGENT.to_owned(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Permissions and temp-file prefixes; the overwrite flag is set per call.
    pub fn with_write_options(mut self, options: AtomicWriteOptions) -> Self {
        self.write_options = options;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy { &self.policy }

    pub fn client(&self) -> &C { &self.client }

    pub async fn download(
        &self,
        url: &str,
        destination: impl AsRef<Path>,
        overwrite: bool,
        scope: &CancelScope,
    ) -> std::result::Result<Downloaded, DownloadError> {
        let request = DownloadRequest::new(url, destination.as_ref()).overwrite(overwrite);
        self.fetch(&request, scope).await
    }

    /// Run `request` to completion, retrying transient failures.
    ///
    /// Backoff sleeps are cut short by cancellation or the scope's deadline,
    /// in which case the error is [`TransferError::Interrupted`].
    pub async fn fetch(
        &self,
        request: &DownloadRequest,
        scope: &CancelScope,
    ) -> std::result::Result<Downloaded, DownloadError> {
        request.validate().map_err(|source| DownloadError {
            source,
            last_content_type: None,
            attempts: 0,
        })?;

        let url = request.url.trim();
        let mut attempts = 0;
        let mut last_content_type = None;

        loop {
            attempts += 1;
            debug!(url, attempt = attempts, "requesting asset");

            let (outcome, content_type) = self
                .attempt(url, &request.destination, request.overwrite, scope)
                .await;
            if content_type.is_some() {
                last_content_type = content_type;
            }

            let source = match outcome {
                Ok(bytes_written) => {
                    debug!(
                        url,
                        bytes = bytes_written,
                        attempts,
                        path = %request.destination.display(),
                        "download complete"
                    );
                    return Ok(Downloaded {
                        bytes_written,
                        content_type: last_content_type,
                        attempts,
                    });
                }
                Err(err) => err,
            };

            if !source.is_retryable() || attempts >= self.policy.get_max_attempts() {
                debug!(url, attempts, error = %source, "giving up on download");
                return Err(DownloadError {
                    source,
                    last_content_type,
                    attempts,
                });
            }

            let delay = self.policy.delay_for_retry(attempts - 1);
            debug!(url, attempt = attempts, ?delay, error = %source, "retrying download");
            if let Err(interrupt) = scope.sleep(delay).await {
                return Err(DownloadError {
                    source: interrupt.into(),
                    last_content_type,
                    attempts,
                });
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        destination: &Path,
        overwrite: bool,
        scope: &CancelScope,
    ) -> (Result<u64>, Option<String>) {
        let request = HttpRequest::get(url)
            .header("Accept", "*/*")
            .header("User-Agent", self.user_agent.as_str());

        let response = match scope.run(self.client.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return (Err(TransferError::network(err)), None),
            Err(interrupt) => return (Err(interrupt.into()), None),
        };

        let content_type = response.content_type.clone();
        if !response.is_success() {
            let code = response.status;
            let outcome = match response.error_message(scope).await {
                Ok(message) => Err(TransferError::Status { code, message }),
                Err(interrupt) => Err(interrupt.into()),
            };
            return (outcome, content_type);
        }

        let outcome = self.write_body(response.body, destination, overwrite, scope).await;
        (outcome, content_type)
    }

    async fn write_body<E>(
        &self,
        mut body: BoxStream<'static, std::result::Result<bytes::Bytes, E>>,
        destination: &Path,
        overwrite: bool,
        scope: &CancelScope,
    ) -> Result<u64>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let options = self.write_options.clone().overwrite(overwrite);
        let mut staged = AtomicFile::create(destination, &options)?;
        let staging_path = staged.staging_path().to_path_buf();

        let handle = staged
            .file_mut()
            .try_clone()
            .map_err(TransferError::io(&staging_path))?;
        let mut file = tokio::fs::File::from_std(handle);

        let mut written = 0u64;
        while let Some(chunk) = scope.run(body.next()).await? {
            let chunk = chunk.map_err(TransferError::network)?;
            file.write_all(&chunk)
                .await
                .map_err(TransferError::io(&staging_path))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(TransferError::io(&staging_path))?;
        drop(file);

        staged.commit()?;
        Ok(written)
    }
}
