#![allow(dead_code)]

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use campus_api::{
    ByteStream, CampusApiError, CancellationSignal, Query, RouteUpdateRequest,
    RouteUpdateResponse, StatusCode,
};
use campus_nav::location::{GeolocationSource, PositionStream, RawPosition};
use campus_nav::route::RouteUpdater;
use campus_nav::session::{FinishedSession, QueryTransport, SessionHandlers, SessionId};
use campus_nav::GeolocationError;
use futures_util::{stream, StreamExt};
use tokio::sync::oneshot;

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub fn sse(frames: &[&str]) -> String {
    frames
        .iter()
        .map(|frame| format!("data: {frame}\n\n"))
        .collect()
}

#[derive(Clone)]
pub struct Chunk {
    pub delay: Duration,
    pub bytes: String,
}

impl Chunk {
    pub fn now(bytes: impl Into<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            bytes: bytes.into(),
        }
    }

    pub fn after(delay: Duration, bytes: impl Into<String>) -> Self {
        Self {
            delay,
            bytes: bytes.into(),
        }
    }
}

#[derive(Clone)]
pub enum StreamScript {
    /// Deliver chunks, then end the stream.
    Chunks(Vec<Chunk>),
    /// Deliver chunks, then stay open without further bytes.
    ChunksThenHold(Vec<Chunk>),
    /// Fail to open with this error message and status.
    Reject(u16, &'static str),
}

/// Query transport that replays one script per `open` call, in order.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<Vec<StreamScript>>,
    opened: Mutex<Vec<Query>>,
    cancels: Mutex<Vec<CancellationSignal>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<StreamScript>) -> Arc<Self> {
        let mut scripts = scripts;
        scripts.reverse();
        Arc::new(Self {
            scripts: Mutex::new(scripts),
            ..Self::default()
        })
    }

    pub fn opened(&self) -> Vec<Query> {
        lock_unpoisoned(&self.opened).clone()
    }

    /// Whether the cancellation flag of the `index`-th opened stream is set.
    pub fn was_cancelled(&self, index: usize) -> bool {
        lock_unpoisoned(&self.cancels)
            .get(index)
            .is_some_and(|cancel| cancel.load(Ordering::Acquire))
    }
}

fn chunk_stream(chunks: Vec<Chunk>) -> stream::BoxStream<'static, Result<Bytes, CampusApiError>> {
    stream::iter(chunks)
        .then(|chunk| async move {
            if !chunk.delay.is_zero() {
                tokio::time::sleep(chunk.delay).await;
            }
            Ok(Bytes::from(chunk.bytes))
        })
        .boxed()
}

#[async_trait]
impl QueryTransport for ScriptedTransport {
    async fn open(
        &self,
        query: &Query,
        cancel: &CancellationSignal,
    ) -> Result<ByteStream, CampusApiError> {
        lock_unpoisoned(&self.opened).push(query.clone());
        lock_unpoisoned(&self.cancels).push(Arc::clone(cancel));
        let script = lock_unpoisoned(&self.scripts)
            .pop()
            .unwrap_or(StreamScript::Chunks(Vec::new()));

        match script {
            StreamScript::Chunks(chunks) => Ok(chunk_stream(chunks)),
            StreamScript::ChunksThenHold(chunks) => {
                Ok(chunk_stream(chunks).chain(stream::pending()).boxed())
            }
            StreamScript::Reject(status, message) => Err(CampusApiError::Status(
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message.to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerCall {
    Reasoning(SessionId, String),
    Answer(SessionId),
    Error(SessionId, String),
}

/// Session handlers that record every callback.
#[derive(Clone, Default)]
pub struct RecordingHandlers {
    pub calls: Arc<Mutex<Vec<HandlerCall>>>,
    pub finished: Arc<Mutex<Vec<FinishedSession>>>,
}

impl RecordingHandlers {
    pub fn calls(&self) -> Vec<HandlerCall> {
        lock_unpoisoned(&self.calls).clone()
    }

    pub fn boxed(&self) -> Box<dyn SessionHandlers> {
        Box::new(self.clone())
    }
}

impl SessionHandlers for RecordingHandlers {
    fn on_reasoning(&mut self, session_id: SessionId, step: &str) {
        lock_unpoisoned(&self.calls).push(HandlerCall::Reasoning(session_id, step.to_string()));
    }

    fn on_answer(&mut self, session: &FinishedSession) {
        lock_unpoisoned(&self.calls).push(HandlerCall::Answer(session.id));
        lock_unpoisoned(&self.finished).push(session.clone());
    }

    fn on_error(&mut self, session: &FinishedSession) {
        let message = session
            .error()
            .map(ToString::to_string)
            .unwrap_or_default();
        lock_unpoisoned(&self.calls).push(HandlerCall::Error(session.id, message));
        lock_unpoisoned(&self.finished).push(session.clone());
    }
}

type PendingResponse = Option<oneshot::Sender<Result<RouteUpdateResponse, CampusApiError>>>;

/// Route updater whose responses the test resolves by hand, in any order.
#[derive(Default)]
pub struct ManualUpdater {
    requests: Mutex<Vec<(RouteUpdateRequest, PendingResponse)>>,
}

impl ManualUpdater {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<RouteUpdateRequest> {
        lock_unpoisoned(&self.requests)
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    /// Yields until `count` requests have reached the updater.
    pub async fn wait_for_requests(&self, count: usize) {
        for _ in 0..1_000 {
            if lock_unpoisoned(&self.requests).len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {count} route requests");
    }

    /// Resolves the request with 1-based sequence `seq`.
    pub fn resolve(&self, seq: u64, response: Result<RouteUpdateResponse, CampusApiError>) {
        let sender = lock_unpoisoned(&self.requests)
            .get_mut(seq as usize - 1)
            .and_then(|(_, sender)| sender.take())
            .expect("unresolved route request");
        let _ = sender.send(response);
    }
}

#[async_trait]
impl RouteUpdater for ManualUpdater {
    async fn update_route(
        &self,
        request: &RouteUpdateRequest,
    ) -> Result<RouteUpdateResponse, CampusApiError> {
        let (sender, receiver) = oneshot::channel();
        lock_unpoisoned(&self.requests).push((request.clone(), Some(sender)));
        receiver
            .await
            .unwrap_or_else(|_| Err(CampusApiError::Cancelled))
    }
}

pub fn route_success(coords: &[(f64, f64)], distance: &str) -> RouteUpdateResponse {
    let coords: Vec<serde_json::Value> = coords
        .iter()
        .map(|(lat, lng)| serde_json::json!({"lat": lat, "lng": lng}))
        .collect();
    serde_json::from_value(serde_json::json!({
        "status": "success",
        "distance_remaining": distance,
        "route_coords": coords,
    }))
    .expect("route response")
}

pub fn route_error(message: &str) -> RouteUpdateResponse {
    serde_json::from_value(serde_json::json!({"status": "error", "message": message}))
        .expect("route response")
}

/// Geolocation source replaying fixed results; optionally holds the watch
/// open afterwards.
pub struct FakeGeolocation {
    pub start_error: Option<GeolocationError>,
    pub positions: Vec<Result<RawPosition, GeolocationError>>,
    pub hold_open: bool,
    pub watches: Mutex<usize>,
}

impl FakeGeolocation {
    pub fn replay(positions: Vec<Result<RawPosition, GeolocationError>>) -> Arc<Self> {
        Arc::new(Self {
            start_error: None,
            positions,
            hold_open: false,
            watches: Mutex::new(0),
        })
    }

    pub fn replay_and_hold(positions: Vec<Result<RawPosition, GeolocationError>>) -> Arc<Self> {
        Arc::new(Self {
            start_error: None,
            positions,
            hold_open: true,
            watches: Mutex::new(0),
        })
    }

    pub fn failing(error: GeolocationError) -> Arc<Self> {
        Arc::new(Self {
            start_error: Some(error),
            positions: Vec::new(),
            hold_open: false,
            watches: Mutex::new(0),
        })
    }

    pub fn watch_count(&self) -> usize {
        *lock_unpoisoned(&self.watches)
    }
}

impl GeolocationSource for FakeGeolocation {
    fn watch_position(&self) -> Result<PositionStream, GeolocationError> {
        *lock_unpoisoned(&self.watches) += 1;
        if let Some(error) = &self.start_error {
            return Err(error.clone());
        }

        let positions = stream::iter(self.positions.clone());
        if self.hold_open {
            Ok(positions.chain(stream::pending()).boxed())
        } else {
            Ok(positions.boxed())
        }
    }
}
