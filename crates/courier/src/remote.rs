use courier_transfer::core::status_message;
use courier_transfer::data::{LocalAsset, RemoteRecord};
use courier_transfer::{AssetDeliveryState, AssetRemote, BoxError, HttpClient, HttpRequest};
use courier_verify::Checksum;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url:    String,
        #[source]
        source: BoxError,
    },

    #[error("{url} answered {code}: {message}")]
    Status { url: String, code: u16, message: String },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url:    String,
        #[source]
        source: serde_json::Error,
    },
}

/// Asset service speaking plain JSON over HTTP.
///
/// - `POST {base}/assets` with `{fileName, fileSize, mimeType}` returns a record
/// - `PATCH {base}/assets/{id}` with `{uploaded, checksum, checksumAlgorithm}` commits it
/// - `GET {base}/assets/{id}/delivery` returns `{state, errors}`
pub struct JsonRemote<C: HttpClient> {
    client:  C,
    base:    String,
    headers: Vec<(String, String)>,
}

impl<C: HttpClient> JsonRemote<C> {
    pub fn new(client: C, base: &str) -> Self {
        Self {
            client,
            base: base.trim().trim_end_matches('/').to_owned(),
            headers: Vec::new(),
        }
    }

    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, path: &str, body: Option<Value>) -> Result<T, RemoteError> {
        let url = format!("{}/{}", self.base, path);
        let mut request = HttpRequest::new(method, url.as_str()).header("Accept", "application/json");
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .body(body.to_string());
        }

        let transport = |source: BoxError| RemoteError::Transport {
            url: url.clone(),
            source,
        };
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| transport(err.into()))?;

        let status = response.status;
        let success = response.is_success();
        let mut stream = response.body;
        let mut bytes = Vec::new();
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk.map_err(|err| transport(err.into()))?);
        }

        if !success {
            return Err(RemoteError::Status {
                url,
                code: status,
                message: status_message(status, &bytes),
            });
        }
        // Commit answers may be empty; treat that as JSON null.
        let bytes = if bytes.iter().all(u8::is_ascii_whitespace) { b"null".to_vec() } else { bytes };
        serde_json::from_slice(&bytes).map_err(|source| RemoteError::Decode { url, source })
    }
}

impl<C: HttpClient> AssetRemote for JsonRemote<C> {
    type Error = RemoteError;

    async fn create_record(&self, asset: &LocalAsset) -> Result<RemoteRecord, RemoteError> {
        let body = json!({
            "fileName": asset.name,
            "fileSize": asset.size,
            "mimeType": asset.media_type.mime(),
        });
        self.call("POST", "assets", Some(body)).await
    }

    async fn commit(&self, asset_id: &str, checksum: &Checksum) -> Result<(), RemoteError> {
        let body = json!({
            "uploaded": true,
            "checksum": checksum.hash,
            "checksumAlgorithm": checksum.algorithm,
        });
        let _: Value = self.call("PATCH", &format!("assets/{asset_id}"), Some(body)).await?;
        Ok(())
    }

    async fn fetch_state(&self, asset_id: &str) -> Result<AssetDeliveryState, RemoteError> {
        self.call("GET", &format!("assets/{asset_id}/delivery"), None).await
    }
}
