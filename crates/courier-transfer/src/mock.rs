//! In-memory stand-ins for the network and the asset service.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use courier_verify::Checksum;
use futures_util::{StreamExt, stream};
use thiserror::Error;

use crate::data::{AssetDeliveryState, LocalAsset, RemoteRecord};
use crate::effects::{AssetRemote, HttpClient, HttpRequest, HttpResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MockError(pub String);

enum Step {
    Respond {
        status:       u16,
        content_type: Option<String>,
        chunks:       Vec<Bytes>,
        ending:       Ending,
    },
    Fail(String),
    Hang,
}

/// What the body stream does after its last chunk.
enum Ending {
    Close,
    Fail(String),
    Stall,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> { mutex.lock().unwrap_or_else(PoisonError::into_inner) }

/// HTTP client that replays a fixed script, one step per request.
///
/// Requests beyond the end of the script fail with a transport error.
#[derive(Default)]
pub struct ScriptedClient {
    steps:    Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self { Self::default() }

    fn push(self, step: Step) -> Self {
        lock(&self.steps).push_back(step);
        self
    }

    pub fn respond<I, T>(self, status: u16, content_type: &str, chunks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.respond_with(status, content_type, chunks, Ending::Close)
    }

    fn respond_with<I, T>(self, status: u16, content_type: &str, chunks: I, ending: Ending) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.push(Step::Respond {
            status,
            content_type: Some(content_type.to_owned()),
            chunks: chunks.into_iter().map(|c| Bytes::copy_from_slice(c.as_ref())).collect(),
            ending,
        })
    }

    /// A plain-text response, typically an error status.
    pub fn status(self, status: u16, body: &str) -> Self { self.respond(status, "text/plain", [body]) }

    /// Headers and some of the body arrive, then the connection drops.
    pub fn respond_then_fail<I, T>(self, status: u16, content_type: &str, chunks: I, error: &str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.respond_with(status, content_type, chunks, Ending::Fail(error.to_owned()))
    }

    /// Headers and some of the body arrive, then the server goes silent.
    pub fn respond_then_hang<I, T>(self, status: u16, content_type: &str, chunks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.respond_with(status, content_type, chunks, Ending::Stall)
    }

    /// The request fails before any response.
    pub fn fail(self, error: &str) -> Self { self.push(Step::Fail(error.to_owned())) }

    /// The request never completes.
    pub fn hang(self) -> Self { self.push(Step::Hang) }

    pub fn calls(&self) -> usize { lock(&self.requests).len() }

    pub fn requests(&self) -> Vec<HttpRequest> { lock(&self.requests).clone() }
}

impl HttpClient for ScriptedClient {
    type Error = MockError;

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse<MockError>, MockError> {
        lock(&self.requests).push(request);
        let step = lock(&self.steps).pop_front();

        match step {
            None => Err(MockError("no scripted response left".to_owned())),
            Some(Step::Fail(message)) => Err(MockError(message)),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Respond {
                status,
                content_type,
                chunks,
                ending,
            }) => {
                let mut items: Vec<Result<Bytes, MockError>> = chunks.into_iter().map(Ok).collect();
                let body = match ending {
                    Ending::Close => stream::iter(items).boxed(),
                    Ending::Fail(message) => {
                        items.push(Err(MockError(message)));
                        stream::iter(items).boxed()
                    }
                    Ending::Stall => stream::iter(items).chain(stream::pending()).boxed(),
                };
                Ok(HttpResponse {
                    status,
                    content_type,
                    body,
                })
            }
        }
    }
}

/// What a [`MockRemote`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    Created { name: String, size: u64, mime: &'static str },
    Committed { asset_id: String, checksum: Checksum },
    Fetched { asset_id: String },
}

/// Asset service that hands out one record and replays delivery states.
///
/// The last scripted state repeats once the script runs out.
pub struct MockRemote {
    record: RemoteRecord,
    states: Mutex<VecDeque<AssetDeliveryState>>,
    last:   Mutex<Option<AssetDeliveryState>>,
    events: Mutex<Vec<RemoteEvent>>,
}

impl MockRemote {
    pub fn new(record: RemoteRecord) -> Self {
        Self {
            record,
            states: Mutex::default(),
            last: Mutex::default(),
            events: Mutex::default(),
        }
    }

    pub fn states(self, states: impl IntoIterator<Item = AssetDeliveryState>) -> Self {
        lock(&self.states).extend(states);
        self
    }

    pub fn events(&self) -> Vec<RemoteEvent> { lock(&self.events).clone() }

    pub fn committed(&self) -> bool {
        lock(&self.events)
            .iter()
            .any(|event| matches!(event, RemoteEvent::Committed { .. }))
    }

    pub fn fetches(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|event| matches!(event, RemoteEvent::Fetched { .. }))
            .count()
    }
}

impl AssetRemote for MockRemote {
    type Error = MockError;

    async fn create_record(&self, asset: &LocalAsset) -> Result<RemoteRecord, MockError> {
        lock(&self.events).push(RemoteEvent::Created {
            name: asset.name.clone(),
            size: asset.size,
            mime: asset.media_type.mime(),
        });
        Ok(self.record.clone())
    }

    async fn commit(&self, asset_id: &str, checksum: &Checksum) -> Result<(), MockError> {
        lock(&self.events).push(RemoteEvent::Committed {
            asset_id: asset_id.to_owned(),
            checksum: checksum.clone(),
        });
        Ok(())
    }

    async fn fetch_state(&self, asset_id: &str) -> Result<AssetDeliveryState, MockError> {
        lock(&self.events).push(RemoteEvent::Fetched {
            asset_id: asset_id.to_owned(),
        });
        let mut last = lock(&self.last);
        if let Some(next) = lock(&self.states).pop_front() {
            *last = Some(next);
        }
        last.clone()
            .ok_or_else(|| MockError("no delivery state scripted".to_owned()))
    }
}
