//! Client-side session manager for the campus navigation assistant.
//!
//! Two independent loops run per chat context:
//!
//! - **Query sessions.** [`ChatSessionDriver`] opens one streamed request per
//!   submitted [`Query`], feeds parsed frames through
//!   [`SessionStateMachine`], and fires handlers in arrival order: reasoning
//!   steps first, then exactly one answer or error. A new submission closes
//!   the previous stream before opening the next; cancellation suppresses
//!   every frame still in flight.
//! - **Navigation.** [`LocationTracker`] samples positions and applies the
//!   campus-bounds fallback; [`RouteRecalculationLoop`] turns due samples
//!   into sequence-tagged route updates and applies only the newest result.
//!
//! [`ChatPresentationAdapter`] turns finished sessions and route state into
//! display records.
//!
//! Transport lives in the `campus_api` crate; this crate owns lifecycle
//! rules only and installs no logging subscriber.

pub mod error;
pub mod location;
pub mod presentation;
pub mod route;
pub mod session;

pub use campus_api::{
    AnswerPayload, CampusApiClient, CampusApiConfig, LatLng, Query, StreamFrame, TravelMode,
    Urgency,
};
pub use error::{GeolocationError, RecalculationError, SessionError};
pub use location::{
    GeolocationSource, LocationSample, LocationStatus, LocationTracker, PositionStream,
    RawPosition, TrackerConfig, CAMPUS_BOUNDS, DEFAULT_COORDINATE,
};
pub use presentation::{ChatMessage, ChatPresentationAdapter, ChatRole, MapOverlay};
pub use route::{
    Destination, RecalculationConfig, RouteRecalculationLoop, RouteState, RouteUpdate,
    RouteUpdater, SampleDisposition,
};
pub use session::{
    ChatSessionDriver, FinishedSession, LiveView, NoopHandlers, QueryTransport,
    ReasoningSnapshot, SessionHandlers, SessionId, SessionOutcome, SessionPhase,
    SessionStateMachine, StreamSession, Transition,
};
