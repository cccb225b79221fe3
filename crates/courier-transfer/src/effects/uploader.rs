use std::fs::{self, File};
use std::future::Future;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use courier_verify::{Checksum, ChecksumAlgorithm, checksum_reader};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, trace};

use super::poller::{DEFAULT_POLL_INTERVAL, wait_for_delivery};
use super::{CancelScope, HttpClient, HttpRequest};
use crate::data::{AssetDeliveryState, AssetUploadResult, DeliveryState, LocalAsset, MediaType, RemoteRecord, UploadOperation};
use crate::error::{Result, TransferError};

/// Upper bound on one upload, from validation through delivery.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// The service that owns asset records.
///
/// The byte transfer itself goes through an [`HttpClient`] using the
/// operations returned by [`AssetRemote::create_record`]; this trait only
/// covers the record lifecycle.
pub trait AssetRemote: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reserve a record for `asset` and return where its bytes should go.
    fn create_record(&self, asset: &LocalAsset) -> impl Future<Output = std::result::Result<RemoteRecord, Self::Error>> + Send;

    /// Mark the record as fully uploaded.
    fn commit(&self, asset_id: &str, checksum: &Checksum) -> impl Future<Output = std::result::Result<(), Self::Error>> + Send;

    fn fetch_state(&self, asset_id: &str) -> impl Future<Output = std::result::Result<AssetDeliveryState, Self::Error>> + Send;
}

/// Pushes local media to an [`AssetRemote`] and waits for it to be processed.
pub struct Uploader<C: HttpClient> {
    client:        C,
    poll_interval: Duration,
    timeout:       Option<Duration>,
    algorithm:     ChecksumAlgorithm,
}

impl<C: HttpClient> Uploader<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_UPLOAD_TIMEOUT),
            algorithm: ChecksumAlgorithm::default(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// `None` leaves the deadline entirely to the caller's scope.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_checksum_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Upload a single file.
    pub async fn upload<R: AssetRemote>(&self, path: impl AsRef<Path>, remote: &R, scope: &CancelScope) -> Result<AssetUploadResult> {
        let asset = validate_asset_file(path.as_ref())?;
        let scope = self.bounded(scope);
        self.upload_asset(asset, remote, &scope).await
    }

    /// Upload a file, or every file directly inside a directory in name order.
    ///
    /// Stops at the first failure; files already delivered stay delivered.
    pub async fn upload_all<R: AssetRemote>(
        &self,
        path: impl AsRef<Path>,
        remote: &R,
        scope: &CancelScope,
    ) -> Result<Vec<AssetUploadResult>> {
        let assets = collect_asset_files(path.as_ref())?;
        let scope = self.bounded(scope);
        let mut results = Vec::with_capacity(assets.len());
        for asset in assets {
            results.push(self.upload_asset(asset, remote, &scope).await?);
        }
        Ok(results)
    }

    fn bounded(&self, scope: &CancelScope) -> CancelScope {
        match self.timeout {
            Some(timeout) => scope.child().with_timeout(timeout),
            None => scope.child(),
        }
    }

    async fn upload_asset<R: AssetRemote>(&self, asset: LocalAsset, remote: &R, scope: &CancelScope) -> Result<AssetUploadResult> {
        scope.check()?;
        let file = courier_fs::open_no_follow(&asset.path)?;
        let (checksum, hashed) = self.checksum(&file, &asset.path, scope).await?;
        if hashed != asset.size {
            return Err(TransferError::InvalidInput(format!(
                "{} changed size while it was being read",
                asset.path.display()
            )));
        }

        debug!(file = %asset.name, size = asset.size, %checksum, "creating asset record");
        let record = scope
            .run(remote.create_record(&asset))
            .await?
            .map_err(TransferError::remote)?;
        if record.upload_operations.is_empty() {
            return Err(TransferError::remote(format!(
                "no upload operations returned for asset {}",
                record.id
            )));
        }
        validate_operations(&record.upload_operations, asset.size)?;

        let mut file = tokio::fs::File::from_std(file);
        let total = record.upload_operations.len();
        for (index, operation) in record.upload_operations.iter().enumerate() {
            self.send_part(&mut file, &asset.path, operation, scope).await?;
            trace!(asset_id = %record.id, part = index + 1, total, "part uploaded");
        }

        scope
            .run(remote.commit(&record.id, &checksum))
            .await?
            .map_err(TransferError::remote)?;
        debug!(asset_id = %record.id, "upload committed, waiting for delivery");

        let asset_id = record.id.as_str();
        let outcome = wait_for_delivery(scope, self.poll_interval, asset_id, move || async move {
            remote.fetch_state(asset_id).await.map_err(TransferError::remote)
        })
        .await;
        let state = outcome.last_state.clone().unwrap_or(DeliveryState::Complete);
        outcome.into_result()?;

        Ok(AssetUploadResult {
            file_name: asset.name,
            file_path: asset.path,
            asset_id: record.id,
            checksum,
            state,
        })
    }

    async fn checksum(&self, file: &File, path: &Path, scope: &CancelScope) -> Result<(Checksum, u64)> {
        let mut reader = file.try_clone().map_err(TransferError::io(path))?;
        let algorithm = self.algorithm;
        let hashing = tokio::task::spawn_blocking(move || {
            reader.seek(SeekFrom::Start(0))?;
            checksum_reader(reader, algorithm)
        });

        scope
            .run(hashing)
            .await?
            .map_err(|err| TransferError::io(path)(io::Error::other(err)))?
            .map_err(TransferError::io(path))
    }

    async fn send_part(
        &self,
        file: &mut tokio::fs::File,
        path: &Path,
        operation: &UploadOperation,
        scope: &CancelScope,
    ) -> Result<()> {
        let length = usize::try_from(operation.length)
            .map_err(|_| TransferError::InvalidInput(format!("upload part of {} bytes is too large", operation.length)))?;
        let mut chunk = vec![0u8; length];
        file.seek(SeekFrom::Start(operation.offset))
            .await
            .map_err(TransferError::io(path))?;
        file.read_exact(&mut chunk).await.map_err(TransferError::io(path))?;

        let mut request = HttpRequest::new(operation.method.as_str(), operation.url.as_str()).body(chunk);
        for header in &operation.request_headers {
            request = request.header(header.name.as_str(), header.value.as_str());
        }

        let response = scope
            .run(self.client.execute(request))
            .await?
            .map_err(TransferError::network)?;
        if !response.is_success() {
            let code = response.status;
            let message = response.error_message(scope).await?;
            return Err(TransferError::Status { code, message });
        }
        Ok(())
    }
}

/// Check that `path` is a non-empty regular file of a supported media type.
pub fn validate_asset_file(path: &Path) -> Result<LocalAsset> {
    let meta = fs::symlink_metadata(path).map_err(TransferError::io(path))?;
    if meta.file_type().is_symlink() {
        return Err(courier_fs::Error::Symlink {
            path: path.to_path_buf(),
        }
        .into());
    }
    if !meta.is_file() {
        return Err(TransferError::InvalidInput(format!(
            "expected regular file: {}",
            path.display()
        )));
    }
    if meta.len() == 0 {
        return Err(TransferError::InvalidInput(format!("file is empty: {}", path.display())));
    }

    let media_type = MediaType::from_path(path).ok_or_else(|| {
        TransferError::InvalidInput(format!("unsupported file type: {}", path.display()))
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| TransferError::InvalidInput(format!("no file name in {}", path.display())))?;

    Ok(LocalAsset {
        path: path.to_path_buf(),
        name,
        size: meta.len(),
        media_type,
    })
}

/// Expand `path` into the files to upload.
///
/// A file yields itself. A directory yields every file directly inside it,
/// sorted by path; subdirectories are skipped and an empty directory is an
/// error. Symlinks are refused at either level.
pub fn collect_asset_files(path: &Path) -> Result<Vec<LocalAsset>> {
    let meta = fs::symlink_metadata(path).map_err(TransferError::io(path))?;
    if meta.file_type().is_symlink() {
        return Err(courier_fs::Error::Symlink {
            path: path.to_path_buf(),
        }
        .into());
    }
    if !meta.is_dir() {
        return Ok(vec![validate_asset_file(path)?]);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(path).map_err(TransferError::io(path))? {
        let entry = entry.map_err(TransferError::io(path))?;
        let file_type = entry.file_type().map_err(TransferError::io(entry.path()))?;
        if file_type.is_dir() {
            continue;
        }
        files.push(entry.path());
    }
    if files.is_empty() {
        return Err(TransferError::InvalidInput(format!("no files found in {}", path.display())));
    }
    files.sort();

    files.iter().map(|file| validate_asset_file(file)).collect()
}

fn validate_operations(operations: &[UploadOperation], size: u64) -> Result<()> {
    for (index, operation) in operations.iter().enumerate() {
        let problem = if operation.method.trim().is_empty() {
            Some("has no method")
        } else if operation.url.trim().is_empty() {
            Some("has no URL")
        } else if operation.length == 0 {
            Some("is empty")
        } else if operation.end().is_none_or(|end| end > size) {
            Some("extends past the end of the file")
        } else {
            None
        };
        if let Some(problem) = problem {
            return Err(TransferError::remote(format!("upload operation {index} {problem}")));
        }
    }
    Ok(())
}
