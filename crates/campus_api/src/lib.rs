//! Transport-only client primitives for the campus navigation backend.
//!
//! This crate owns request building, streamed-frame parsing and response
//! decoding for the two backend endpoints the navigation client talks to:
//! the streamed AI query endpoint and the location/route update endpoint.
//! It holds no session state and no UI coupling; lifecycle rules live in the
//! `campus_nav` core.
//!
//! Frame normalization maps the backend's string-tagged `type` field onto
//! [`StreamFrame`], keeping unrecognized tags as [`StreamFrame::Unknown`] so
//! callers can ignore them explicitly.
//!
//! Queries are sent as `GET` requests with URL parameters so they can be
//! consumed as an event stream; see [`url::DEFAULT_QUERY_STREAM_PATH`] for
//! what that requires of the backend.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod sse;
pub mod url;

pub use client::{ByteStream, CampusApiClient, CancellationSignal};
pub use config::CampusApiConfig;
pub use error::CampusApiError;
pub use events::{AnswerPayload, StreamFrame};
pub use payload::{
    LatLng, Query, QueryParams, RouteUpdateRequest, RouteUpdateResponse, TravelMode, Urgency,
};
pub use reqwest::StatusCode;
pub use sse::FrameParser;
pub use url::join_endpoint;
