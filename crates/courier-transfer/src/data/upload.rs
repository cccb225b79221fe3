use std::path::{Path, PathBuf};

use courier_verify::Checksum;
use serde::{Deserialize, Serialize};

use super::DeliveryState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name:  String,
    pub value: String,
}

/// One byte range of the local file and the request that delivers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOperation {
    pub method:          String,
    pub url:             String,
    pub offset:          u64,
    pub length:          u64,
    #[serde(default)]
    pub request_headers: Vec<HttpHeader>,
}

impl UploadOperation {
    /// Exclusive end of the byte range, `None` on overflow.
    pub fn end(&self) -> Option<u64> { self.offset.checked_add(self.length) }
}

/// A record reserved on the remote for a file about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub id:                String,
    #[serde(default)]
    pub upload_operations: Vec<UploadOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUploadResult {
    pub file_name: String,
    pub file_path: PathBuf,
    pub asset_id:  String,
    pub checksum:  Checksum,
    pub state:     DeliveryState,
}

/// Media kinds accepted for upload, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Png,
    Jpeg,
    Heic,
    QuickTime,
    Mp4,
    M4v,
}

impl MediaType {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "heic" => Some(Self::Heic),
            "mov" => Some(Self::QuickTime),
            "mp4" => Some(Self::Mp4),
            "m4v" => Some(Self::M4v),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Heic => "image/heic",
            Self::QuickTime => "video/quicktime",
            Self::Mp4 => "video/mp4",
            Self::M4v => "video/x-m4v",
        }
    }
}

/// A validated local file ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    pub path:       PathBuf,
    pub name:       String,
    pub size:       u64,
    pub media_type: MediaType,
}
