//! Query session lifecycle: transport task, state machine, reasoning log and
//! the per-context driver that ties them together.

pub mod driver;
pub mod reasoning;
pub mod state;
pub mod stream;

pub use driver::{ChatSessionDriver, NoopHandlers, SessionHandlers};
pub use reasoning::{ReasoningAccumulator, ReasoningSnapshot};
pub use state::{
    FinishedSession, LiveView, Session, SessionId, SessionOutcome, SessionPhase,
    SessionStateMachine, Transition,
};
pub use stream::{QueryTransport, SessionEvent, SessionMessage, StreamSession};
