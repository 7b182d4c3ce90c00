use campus_api::{LatLng, Query};
use serde::Serialize;

use crate::location::{LocationSample, LocationStatus};
use crate::route::RouteState;
use crate::session::state::{FinishedSession, SessionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    Error,
}

/// Finalized chat record handed to the UI. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_coords: Option<Vec<LatLng>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl ChatMessage {
    fn plain(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            reasoning_steps: None,
            route_coords: None,
            distance: None,
            sources: Vec::new(),
        }
    }
}

/// Map-facing projection of the route and the latest position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOverlay {
    pub current_position: Option<LatLng>,
    pub position_status: Option<&'static str>,
    pub route: Vec<LatLng>,
    pub destination: Option<LatLng>,
    pub destination_name: Option<String>,
    pub distance_remaining: Option<String>,
}

/// Builds display records from finished sessions and keeps the transcript
/// of one chat context.
#[derive(Debug, Default, Clone)]
pub struct ChatPresentationAdapter {
    transcript: Vec<ChatMessage>,
}

impl ChatPresentationAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    pub fn push_user(&mut self, query: &Query) -> &ChatMessage {
        self.push(Self::user_message(query))
    }

    pub fn push_finished(&mut self, session: &FinishedSession) -> &ChatMessage {
        self.push(Self::finished_message(session))
    }

    pub fn user_message(query: &Query) -> ChatMessage {
        ChatMessage::plain(ChatRole::User, query.text.trim())
    }

    /// One record per finished session: the answer with its reasoning and
    /// route metadata, or the error text.
    pub fn finished_message(session: &FinishedSession) -> ChatMessage {
        let reasoning_steps = (!session.reasoning.is_empty()).then(|| session.reasoning.to_vec());

        match &session.outcome {
            SessionOutcome::Answered(payload) => ChatMessage {
                role: ChatRole::Assistant,
                content: payload.answer.clone(),
                reasoning_steps,
                route_coords: (!payload.route_coords.is_empty())
                    .then(|| payload.route_coords.clone()),
                distance: payload.distance_estimate.clone(),
                sources: payload.sources.clone(),
            },
            SessionOutcome::Errored(error) => ChatMessage {
                reasoning_steps,
                ..ChatMessage::plain(ChatRole::Error, error.to_string())
            },
        }
    }

    pub fn map_overlay(route: &RouteState, position: Option<&LocationSample>) -> MapOverlay {
        let destination = route.destination.as_ref();
        MapOverlay {
            current_position: position.map(LocationSample::coord),
            position_status: position.map(|sample| sample.status.as_str()),
            route: route.coordinates.clone(),
            destination: destination.map(|destination| destination.coord),
            destination_name: destination.and_then(|destination| destination.name.clone()),
            distance_remaining: route.distance_remaining.clone(),
        }
    }

    /// Short status line for the location indicator.
    pub fn location_status_line(sample: &LocationSample) -> String {
        match sample.status {
            LocationStatus::Actual => format!("{:.5}, {:.5}", sample.lat, sample.lng),
            LocationStatus::OutsideBounds => {
                "outside campus; showing campus reference point".to_string()
            }
            LocationStatus::Denied => "location denied; showing campus reference point".to_string(),
            LocationStatus::UnsupportedDefault => {
                "location unavailable; showing campus reference point".to_string()
            }
        }
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.transcript.push(message);
        &self.transcript[self.transcript.len() - 1]
    }
}
