//! Network, filesystem and clock effects, each behind a seam tests can replace.

mod cancel;
mod downloader;
mod http;
mod poller;
mod uploader;

pub use cancel::CancelScope;
pub use downloader::{Downloaded, Downloader, USER_AGENT};
pub use http::{BoxStream, HttpClient, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")]
pub use http::{ClientError, ReqwestClient};
pub use poller::{DEFAULT_POLL_INTERVAL, PollError, poll_until, wait_for_delivery};
pub use uploader::{AssetRemote, DEFAULT_UPLOAD_TIMEOUT, Uploader, collect_asset_files, validate_asset_file};
