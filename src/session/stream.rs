use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use campus_api::{
    ByteStream, CampusApiClient, CampusApiError, CancellationSignal, FrameParser, Query,
    StreamFrame,
};
use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::session::state::SessionId;

/// Opens the byte stream for one query.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn open(
        &self,
        query: &Query,
        cancel: &CancellationSignal,
    ) -> Result<ByteStream, CampusApiError>;
}

#[async_trait]
impl QueryTransport for CampusApiClient {
    async fn open(
        &self,
        query: &Query,
        cancel: &CancellationSignal,
    ) -> Result<ByteStream, CampusApiError> {
        self.open_query_stream(query, Some(cancel)).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Frame(StreamFrame),
    /// The stream failed to open or broke off; always the last event.
    Failed(SessionError),
}

/// Event tagged with the session that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMessage {
    pub session_id: SessionId,
    pub event: SessionEvent,
}

/// Handle to one streamed request.
///
/// The transport runs on a spawned task that forwards parsed frames in
/// arrival order and stops after the first terminal frame. Cancelling or
/// dropping the handle closes the transport.
#[derive(Debug)]
pub struct StreamSession {
    id: SessionId,
    cancel: CancellationSignal,
    task: JoinHandle<()>,
}

impl StreamSession {
    /// Spawns the transport task for `query`. Must be called inside a tokio
    /// runtime.
    pub fn open(
        id: SessionId,
        query: Query,
        transport: Arc<dyn QueryTransport>,
        sender: UnboundedSender<SessionMessage>,
    ) -> Self {
        let cancel: CancellationSignal = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(pump(id, query, transport, Arc::clone(&cancel), sender));
        Self { id, cancel, task }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Closes the transport. Idempotent.
    pub fn cancel(&self) {
        if self.cancel.swap(true, Ordering::AcqRel) {
            return;
        }

        debug!(session_id = self.id, "closing query stream");
        self.task.abort();
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn pump(
    id: SessionId,
    query: Query,
    transport: Arc<dyn QueryTransport>,
    cancel: CancellationSignal,
    sender: UnboundedSender<SessionMessage>,
) {
    let send = |event: SessionEvent| {
        sender
            .send(SessionMessage {
                session_id: id,
                event,
            })
            .is_ok()
    };

    let mut bytes = match transport.open(&query, &cancel).await {
        Ok(bytes) => bytes,
        Err(error) if error.is_cancelled() => return,
        Err(error) => {
            warn!(session_id = id, %error, "query stream failed to open");
            send(SessionEvent::Failed(SessionError::Transport(error.to_string())));
            return;
        }
    };
    info!(session_id = id, "query stream open");

    let mut parser = FrameParser::default();
    while let Some(chunk) = bytes.next().await {
        if cancel.load(Ordering::Acquire) {
            return;
        }

        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(error) => {
                warn!(session_id = id, %error, "query stream broke off");
                send(SessionEvent::Failed(SessionError::ConnectionLost));
                return;
            }
        };

        for frame in parser.feed(&chunk) {
            let last = frame.is_terminal() || frame == StreamFrame::Done;
            if !send(SessionEvent::Frame(frame)) || last {
                return;
            }
        }
    }

    parser.finish();
    if !cancel.load(Ordering::Acquire) {
        debug!(session_id = id, "query stream closed without a terminal frame");
        send(SessionEvent::Failed(SessionError::ConnectionLost));
    }
}
