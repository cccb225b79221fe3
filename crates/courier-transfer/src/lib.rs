//! Retrying asset downloads, chunked uploads and delivery polling.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Requests, policies and remote records
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations with trait abstraction
//!
//! Every blocking step takes a [`CancelScope`]; cancelling it, or reaching
//! its deadline, stops the transfer at the next await point and leaves no
//! partial file behind.
//!
//! ```no_run
//! use courier_transfer::{CancelScope, Downloader, ReqwestClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(ReqwestClient::new()?);
//! let done = downloader
//!     .download("https://cdn.example/shot.png", "out/shot.png", false, &CancelScope::new())
//!     .await?;
//! println!("{} bytes", done.bytes_written);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;
pub mod mock;

pub use data::{
    AssetDeliveryState, AssetUploadResult, DeliveryState, DownloadRequest, ErrorDetail, PollOutcome, RetryPolicy,
    TransferRequest, UploadRequest,
};
pub use effects::{
    AssetRemote, CancelScope, Downloaded, Downloader, HttpClient, HttpRequest, HttpResponse, Uploader, poll_until,
    wait_for_delivery,
};
#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
pub use error::{BoxError, DownloadError, ErrorClass, Interrupt, Result, TransferError};
