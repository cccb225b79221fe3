use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TransferError;

/// Where a remote asset is in its server-side processing.
///
/// Parsed case-insensitively; anything unrecognised is kept verbatim in
/// [`DeliveryState::Other`] and treated as "still working".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeliveryState {
    AwaitingUpload,
    UploadComplete,
    Processing,
    Complete,
    Failed,
    Other(String),
}

impl DeliveryState {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "AWAITING_UPLOAD" => Self::AwaitingUpload,
            "UPLOAD_COMPLETE" => Self::UploadComplete,
            "PROCESSING" => Self::Processing,
            "COMPLETE" => Self::Complete,
            "FAILED" => Self::Failed,
            _ => Self::Other(value.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AwaitingUpload => "AWAITING_UPLOAD",
            Self::UploadComplete => "UPLOAD_COMPLETE",
            Self::Processing => "PROCESSING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Serialize for DeliveryState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeliveryState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    pub code:    String,
    #[serde(alias = "description")]
    pub message: String,
}

/// A processing state as reported by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDeliveryState {
    pub state:  DeliveryState,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

impl AssetDeliveryState {
    pub fn new(state: DeliveryState) -> Self {
        Self {
            state,
            errors: Vec::new(),
        }
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.push(ErrorDetail {
            code:    code.into(),
            message: message.into(),
        });
        self
    }
}

/// Result of waiting for delivery, always carrying the last state observed.
#[derive(Debug)]
pub struct PollOutcome<T> {
    pub last_state: Option<DeliveryState>,
    pub result:     Result<T, TransferError>,
}

impl<T> PollOutcome<T> {
    pub fn is_ok(&self) -> bool { self.result.is_ok() }

    pub fn into_result(self) -> Result<T, TransferError> { self.result }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(DeliveryState::parse("complete"), DeliveryState::Complete);
        assert_eq!(DeliveryState::parse(" Failed "), DeliveryState::Failed);
        assert_eq!(
            DeliveryState::parse("QUEUED"),
            DeliveryState::Other("QUEUED".to_owned())
        );
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let state: AssetDeliveryState = serde_json::from_str(
            r#"{"state":"FAILED","errors":[{"code":"IMAGE_TOO_SMALL","description":"too small"}]}"#,
        )
        .unwrap();
        assert_eq!(state.state, DeliveryState::Failed);
        assert_eq!(state.errors[0].message, "too small");

        let bare: AssetDeliveryState = serde_json::from_str(r#"{"state":"processing"}"#).unwrap();
        assert_eq!(bare, AssetDeliveryState::new(DeliveryState::Processing));
    }

    #[test]
    fn test_serializes_as_wire_string() {
        let json = serde_json::to_string(&AssetDeliveryState::new(DeliveryState::UploadComplete)).unwrap();
        assert_eq!(json, r#"{"state":"UPLOAD_COMPLETE","errors":[]}"#);
    }
}
