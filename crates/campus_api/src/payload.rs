use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Travel mode forwarded to the backend router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Walking,
    Taxi,
    Urgent,
}

impl TravelMode {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "walking" | "walk" => Self::Walking,
            "taxi" => Self::Taxi,
            "urgent" => Self::Urgent,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Taxi => "taxi",
            Self::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    High,
}

impl Urgency {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Self::Normal,
            "high" => Self::High,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// One user question. Immutable once handed to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    pub location: Option<LatLng>,
    pub mode: TravelMode,
    pub urgency: Urgency,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            location: None,
            mode: TravelMode::default(),
            urgency: Urgency::default(),
        }
    }

    pub fn with_location(mut self, location: LatLng) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Query-string parameters for the streamed query endpoint.
    pub fn to_params(&self) -> QueryParams {
        QueryParams {
            query: self.text.trim().to_owned(),
            mode: self.mode,
            urgency: self.urgency,
            latitude: self.location.map(|location| location.lat),
            longitude: self.location.map(|location| location.lng),
        }
    }
}

/// Wire shape of the streamed query request parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParams {
    pub query: String,
    pub mode: TravelMode,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Parameters of one route recalculation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteUpdateRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    pub mode: TravelMode,
}

/// Route update response. Fields absent on the wire default to empty values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteUpdateResponse {
    pub status: String,
    #[serde(default)]
    pub route: Value,
    #[serde(default, deserialize_with = "distance_as_string")]
    pub distance_remaining: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub route_coords: Vec<LatLng>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub current_location: Option<LatLng>,
}

impl RouteUpdateResponse {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `"420m"`, `420` or `null` for distance-like fields.
pub(crate) fn distance_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.trim().to_owned()),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}
