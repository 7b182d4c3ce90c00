use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::LatLng;

/// Final answer carried by an `answer` frame after normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_coords: Vec<LatLng>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl AnswerPayload {
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Self::default()
        }
    }

    /// Builds a payload from the frame `content` value, which the backend sends
    /// either as the bare answer string or as an object with answer metadata.
    /// `frame_sources` is the optional `sources` sibling of `content`.
    pub fn from_content(content: Option<&Value>, frame_sources: Option<&Value>) -> Self {
        let mut payload = match content {
            Some(Value::String(text)) => Self::text(text.clone()),
            Some(Value::Object(fields)) => {
                let answer = ["answer", "final_answer", "text"]
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(Value::as_str))
                    .unwrap_or_default()
                    .to_owned();
                let distance_estimate = ["distance_estimate", "distance"]
                    .iter()
                    .find_map(|key| fields.get(*key))
                    .and_then(distance_text);
                let route_coords = fields
                    .get("route_coords")
                    .map(parse_coords)
                    .unwrap_or_default();

                Self {
                    answer,
                    distance_estimate,
                    route_coords,
                    sources: fields.get("sources").map(parse_sources).unwrap_or_default(),
                }
            }
            Some(Value::Null) | None => Self::default(),
            Some(other) => Self::text(other.to_string()),
        };

        if payload.sources.is_empty() {
            if let Some(sources) = frame_sources {
                payload.sources = parse_sources(sources);
            }
        }

        payload
    }
}

fn distance_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_coords(value: &Value) -> Vec<LatLng> {
    serde_json::from_value::<Vec<LatLng>>(value.clone()).unwrap_or_default()
}

fn parse_sources(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Stream frame emitted by the parser after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Reasoning { step: String },
    Answer { payload: AnswerPayload },
    Error { message: String },
    Done,
    /// Frame with an unrecognized `type` tag; sessions ignore it.
    Unknown { frame_type: String, payload: Value },
}

impl StreamFrame {
    /// Returns true for frames that end a session (`answer` or `error`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Answer { .. } | Self::Error { .. })
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Reasoning { .. } => "reasoning",
            Self::Answer { .. } => "answer",
            Self::Error { .. } => "error",
            Self::Done => "done",
            Self::Unknown { frame_type, .. } => frame_type,
        }
    }
}
