use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use super::CancelScope;
use crate::core::{ERROR_BODY_LIMIT, status_message};
use crate::error::Interrupt;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// A single outgoing request.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method:  String,
    pub url:     String,
    pub headers: Vec<(String, String)>,
    pub body:    Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method:  method.into(),
            url:     url.into(),
            headers: Vec::new(),
            body:    None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self { Self::new("GET", url) }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    // Signed URLs and bodies are noisy in logs; show their shape only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers.len())
            .field("body", &self.body.as_ref().map(Bytes::len))
            .finish()
    }
}

/// Status line, content type and a streamed body.
pub struct HttpResponse<E> {
    pub status:       u16,
    pub content_type: Option<String>,
    pub body:         BoxStream<'static, Result<Bytes, E>>,
}

impl<E> HttpResponse<E> {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    /// Read at most [`ERROR_BODY_LIMIT`] bytes of the body and turn them into
    /// a one-line message.
    ///
    /// Body read failures are ignored; the status line stands in for an
    /// unreadable body.
    pub(crate) async fn error_message(mut self, scope: &CancelScope) -> Result<String, Interrupt> {
        let mut collected = Vec::new();
        while collected.len() < ERROR_BODY_LIMIT {
            match scope.run(self.body.next()).await? {
                Some(Ok(chunk)) => {
                    let take = chunk.len().min(ERROR_BODY_LIMIT - collected.len());
                    collected.extend_from_slice(&chunk[..take]);
                }
                Some(Err(_)) | None => break,
            }
        }
        Ok(status_message(self.status, &collected))
    }
}

impl<E> fmt::Debug for HttpResponse<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects and apply their own connect timeouts.
/// A response with any status is `Ok`; only transport failures are `Err`.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - [`ScriptedClient`](crate::mock::ScriptedClient): canned responses for tests
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

impl<C: HttpClient> HttpClient for &C {
    type Error = C::Error;

    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send {
        (**self).execute(request)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    pub enum ClientError {
        #[error(transparent)]
        Request(#[from] reqwest::Error),

        #[error("invalid HTTP method {0:?}")]
        InvalidMethod(String),
    }

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self, ClientError> { Self::with_connect_timeout(Duration::from_secs(30)) }

        pub fn with_connect_timeout(timeout: Duration) -> Result<Self, ClientError> {
            let client = reqwest::Client::builder().connect_timeout(timeout).build()?;
            Ok(Self { client })
        }

        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }
    }

    impl HttpClient for ReqwestClient {
        type Error = ClientError;

        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse<Self::Error>, Self::Error> {
            let method = reqwest::Method::from_bytes(request.method.as_bytes())
                .map_err(|_| ClientError::InvalidMethod(request.method.clone()))?;

            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            Ok(HttpResponse {
                status: response.status().as_u16(),
                content_type,
                body: Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(ClientError::from))),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientError, ReqwestClient};
