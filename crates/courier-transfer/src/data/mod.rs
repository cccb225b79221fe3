//! Plain data passed between the transfer layers.

mod delivery;
mod policy;
mod request;
mod upload;

pub use delivery::{AssetDeliveryState, DeliveryState, ErrorDetail, PollOutcome};
pub use policy::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, RetryPolicy};
pub use request::{DownloadRequest, TransferRequest, UploadRequest};
pub use upload::{AssetUploadResult, HttpHeader, LocalAsset, MediaType, RemoteRecord, UploadOperation};
