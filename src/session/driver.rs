use std::sync::Arc;

use campus_api::Query;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::session::state::{
    FinishedSession, LiveView, SessionId, SessionOutcome, SessionPhase, SessionStateMachine,
    Transition,
};
use crate::session::stream::{QueryTransport, SessionEvent, SessionMessage, StreamSession};

/// Callbacks for one submitted query. Exactly one of `on_answer` or
/// `on_error` fires, after every `on_reasoning` call, unless the session is
/// cancelled or superseded first.
pub trait SessionHandlers: Send {
    fn on_reasoning(&mut self, _session_id: SessionId, _step: &str) {}
    fn on_answer(&mut self, _session: &FinishedSession) {}
    fn on_error(&mut self, _session: &FinishedSession) {}
}

/// Handlers that ignore everything; useful when the caller only polls
/// [`ChatSessionDriver::next_event`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandlers;

impl SessionHandlers for NoopHandlers {}

/// Owns the query session of one chat context.
///
/// Transport tasks report over a channel; [`next_event`](Self::next_event)
/// applies each message to the state machine and dispatches handlers, so all
/// session mutation happens on the caller's task.
pub struct ChatSessionDriver {
    transport: Arc<dyn QueryTransport>,
    machine: SessionStateMachine,
    stream: Option<StreamSession>,
    handlers: Option<Box<dyn SessionHandlers>>,
    sender: UnboundedSender<SessionMessage>,
    receiver: UnboundedReceiver<SessionMessage>,
}

impl ChatSessionDriver {
    pub fn new(transport: Arc<dyn QueryTransport>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            transport,
            machine: SessionStateMachine::new(),
            stream: None,
            handlers: None,
            sender,
            receiver,
        }
    }

    /// Closes any open session, then opens a new one for `query`.
    pub fn submit(&mut self, query: Query, handlers: Box<dyn SessionHandlers>) -> SessionId {
        if let Some(previous) = self.stream.take() {
            debug!(session_id = previous.id(), "superseding open session");
            previous.cancel();
        }
        self.handlers = None;

        let id = self.machine.begin(query.clone());
        info!(session_id = id, mode = query.mode.as_str(), "submitting query");
        self.stream = Some(StreamSession::open(
            id,
            query,
            Arc::clone(&self.transport),
            self.sender.clone(),
        ));
        self.handlers = Some(handlers);
        id
    }

    /// Cancels the streaming session, if any. Returns whether one was open.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.machine.cancel();
        if let Some(stream) = self.stream.take() {
            stream.cancel();
        }
        self.handlers = None;

        if let Some(id) = cancelled {
            info!(session_id = id, "session cancelled");
        }
        cancelled.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    pub fn is_streaming(&self) -> bool {
        self.machine.is_streaming()
    }

    pub fn live_view(&self) -> LiveView {
        self.machine.live_view()
    }

    pub fn state(&self) -> &SessionStateMachine {
        &self.machine
    }

    /// Waits for the next transport message that changes session state and
    /// returns the applied transition. Stale messages are skipped.
    ///
    /// Cancel-safe. Pends forever while no session is streaming.
    pub async fn next_event(&mut self) -> Transition {
        loop {
            let Some(message) = self.receiver.recv().await else {
                return Transition::Ignored;
            };

            let transition = self.apply(message);
            if transition != Transition::Ignored {
                return transition;
            }
        }
    }

    /// Drives the streaming session to its terminal outcome. Returns `None`
    /// when nothing is streaming.
    pub async fn run_until_settled(&mut self) -> Option<FinishedSession> {
        while self.is_streaming() {
            if let Transition::Finished(finished) = self.next_event().await {
                return Some(finished);
            }
        }

        None
    }

    /// Applies one transport message. Messages from superseded or cancelled
    /// sessions are ignored before they touch state or handlers.
    pub fn apply(&mut self, message: SessionMessage) -> Transition {
        if self.machine.streaming_id() != Some(message.session_id) {
            debug!(session_id = message.session_id, "dropping message for inactive session");
            return Transition::Ignored;
        }

        let transition = match message.event {
            SessionEvent::Frame(frame) => self.machine.apply_frame(message.session_id, frame),
            SessionEvent::Failed(error) => self.machine.apply_failure(message.session_id, error),
        };

        match &transition {
            Transition::Reasoning { id, step, .. } => {
                if let Some(handlers) = self.handlers.as_mut() {
                    handlers.on_reasoning(*id, step);
                }
            }
            Transition::Finished(finished) => {
                if let Some(stream) = self.stream.take() {
                    stream.cancel();
                }
                if let Some(mut handlers) = self.handlers.take() {
                    match finished.outcome {
                        SessionOutcome::Answered(_) => handlers.on_answer(finished),
                        SessionOutcome::Errored(_) => handlers.on_error(finished),
                    }
                }
                info!(
                    session_id = finished.id,
                    steps = finished.reasoning.len(),
                    answered = finished.answer().is_some(),
                    "session finished"
                );
            }
            Transition::Ignored => {}
        }

        transition
    }
}
