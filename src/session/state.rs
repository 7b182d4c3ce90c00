use campus_api::{AnswerPayload, Query, StreamFrame};
use tracing::debug;

use crate::error::SessionError;
use crate::session::reasoning::{ReasoningAccumulator, ReasoningSnapshot};

pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Streaming,
    Answered,
    Errored,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Answered | Self::Errored)
    }
}

/// One query lifecycle, from submission to terminal resolution or cancel.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    query: Query,
    phase: SessionPhase,
    reasoning: ReasoningAccumulator,
    cancel_requested: bool,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn reasoning(&self) -> ReasoningSnapshot {
        self.reasoning.snapshot()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Answered(AnswerPayload),
    Errored(SessionError),
}

/// Snapshot of a session at its terminal transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSession {
    pub id: SessionId,
    pub query: Query,
    pub outcome: SessionOutcome,
    pub reasoning: ReasoningSnapshot,
}

impl FinishedSession {
    pub fn answer(&self) -> Option<&AnswerPayload> {
        match &self.outcome {
            SessionOutcome::Answered(payload) => Some(payload),
            SessionOutcome::Errored(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SessionError> {
        match &self.outcome {
            SessionOutcome::Errored(error) => Some(error),
            SessionOutcome::Answered(_) => None,
        }
    }
}

/// Result of feeding one input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A reasoning step was appended; `index` is its position in the log.
    Reasoning { id: SessionId, index: usize, step: String },
    Finished(FinishedSession),
    /// Input for a stale, cancelled or settled session; nothing changed.
    Ignored,
}

/// Live projection of the in-progress session for the UI boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveView {
    pub is_streaming: bool,
    pub current_reasoning_steps: ReasoningSnapshot,
}

/// `Idle -> Streaming -> {Answered | Errored} -> Idle`, one session at a time.
///
/// Every input carries the id of the session it belongs to; inputs for any
/// id other than the streaming session are ignored. Nothing here fails.
#[derive(Debug, Default)]
pub struct SessionStateMachine {
    session: Option<Session>,
    last_id: SessionId,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session, superseding whatever session existed.
    pub fn begin(&mut self, query: Query) -> SessionId {
        if let Some(previous) = self.session.as_mut() {
            if previous.phase == SessionPhase::Streaming {
                debug!(session_id = previous.id, "superseding streaming session");
                previous.cancel_requested = true;
                previous.reasoning.seal();
            }
        }

        self.last_id += 1;
        self.session = Some(Session {
            id: self.last_id,
            query,
            phase: SessionPhase::Streaming,
            reasoning: ReasoningAccumulator::new(),
            cancel_requested: false,
        });
        self.last_id
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::Idle, |session| session.phase)
    }

    /// Id of the session that may still receive frames.
    pub fn streaming_id(&self) -> Option<SessionId> {
        self.streaming_session().map(|session| session.id)
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming_session().is_some()
    }

    pub fn live_view(&self) -> LiveView {
        match self.streaming_session() {
            Some(session) => LiveView {
                is_streaming: true,
                current_reasoning_steps: session.reasoning.snapshot(),
            },
            None => LiveView::default(),
        }
    }

    pub fn apply_frame(&mut self, id: SessionId, frame: StreamFrame) -> Transition {
        let Some(session) = self.streaming_session_mut(id) else {
            debug!(session_id = id, kind = frame.kind(), "ignoring frame for inactive session");
            return Transition::Ignored;
        };

        match frame {
            StreamFrame::Reasoning { step } => {
                let index = session.reasoning.len();
                if !session.reasoning.append(step.clone()) {
                    return Transition::Ignored;
                }
                Transition::Reasoning { id, index, step }
            }
            StreamFrame::Answer { payload } => {
                self.finish(SessionPhase::Answered, SessionOutcome::Answered(payload))
            }
            StreamFrame::Error { message } => self.finish(
                SessionPhase::Errored,
                SessionOutcome::Errored(SessionError::Upstream(message)),
            ),
            StreamFrame::Done => {
                debug!(session_id = id, "done frame before answer; treating as disconnect");
                self.finish(
                    SessionPhase::Errored,
                    SessionOutcome::Errored(SessionError::ConnectionLost),
                )
            }
            StreamFrame::Unknown { frame_type, .. } => {
                debug!(session_id = id, %frame_type, "ignoring unknown frame type");
                Transition::Ignored
            }
        }
    }

    /// Ends the streaming session `id` with a transport-level failure.
    pub fn apply_failure(&mut self, id: SessionId, error: SessionError) -> Transition {
        if self.streaming_session_mut(id).is_none() {
            return Transition::Ignored;
        }

        self.finish(SessionPhase::Errored, SessionOutcome::Errored(error))
    }

    /// Cancels the streaming session. Returns its id, or `None` when no
    /// session was streaming. Later input for that id is ignored.
    pub fn cancel(&mut self) -> Option<SessionId> {
        let session = self.session.as_mut()?;
        if session.phase != SessionPhase::Streaming {
            return None;
        }

        session.cancel_requested = true;
        session.reasoning.seal();
        session.phase = SessionPhase::Idle;
        Some(session.id)
    }

    /// Returns a settled session to `Idle`, discarding it. No-op while a
    /// session is streaming.
    pub fn reset(&mut self) {
        if self.is_streaming() {
            return;
        }
        self.session = None;
    }

    fn streaming_session(&self) -> Option<&Session> {
        self.session
            .as_ref()
            .filter(|session| session.phase == SessionPhase::Streaming && !session.cancel_requested)
    }

    fn streaming_session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.session.as_mut().filter(|session| {
            session.id == id
                && session.phase == SessionPhase::Streaming
                && !session.cancel_requested
        })
    }

    fn finish(&mut self, phase: SessionPhase, outcome: SessionOutcome) -> Transition {
        let Some(session) = self.session.as_mut() else {
            return Transition::Ignored;
        };

        session.reasoning.seal();
        session.phase = phase;
        Transition::Finished(FinishedSession {
            id: session.id,
            query: session.query.clone(),
            outcome,
            reasoning: session.reasoning.snapshot(),
        })
    }
}
