use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use campus_api::{
    ByteStream, CampusApiError, CancellationSignal, RouteUpdateRequest, RouteUpdateResponse,
};
use campus_nav::{LatLng, Query, QueryTransport, RouteUpdater, DEFAULT_COORDINATE};
use futures_util::{stream, StreamExt};
use serde_json::{json, Value};

/// Named places the mock backend knows how to route to.
pub const PLACES: &[(&str, LatLng)] = &[
    ("Main Library", LatLng::new(8.5601, 39.2950)),
    ("Student Cafeteria", LatLng::new(8.5552, 39.2887)),
    ("Main Gate", LatLng::new(8.5541, 39.2921)),
    ("Health Center", LatLng::new(8.5588, 39.2869)),
];

/// Deterministic stand-in for the navigation backend. Streams a few
/// reasoning frames followed by a routed answer, and answers route updates
/// with a straight-line route.
#[derive(Debug, Clone, PartialEq)]
pub struct MockBackend {
    frame_delay: Duration,
}

impl MockBackend {
    pub fn new(frame_delay: Duration) -> Self {
        Self { frame_delay }
    }

    const FRAME_DELAY_MS: u64 = 250;

    /// SSE records for one query, in delivery order.
    pub fn script(&self, query: &Query) -> Vec<String> {
        let origin = query.location.unwrap_or(DEFAULT_COORDINATE);
        let (name, destination) = match_place(&query.text);
        let route = straight_route(origin, destination);
        let distance = format_distance(distance_meters(origin, destination));

        let frames = [
            json!({"type": "reasoning", "content": format!("Understanding the request: \"{}\"", query.text.trim())}),
            json!({"type": "reasoning", "content": format!("Matched destination: {name}")}),
            json!({"type": "reasoning", "content": format!("Planning a {} route", query.mode.as_str())}),
            json!({
                "type": "answer",
                "content": {
                    "answer": format!("{name} is about {distance} away. Follow the highlighted route."),
                    "distance_estimate": distance,
                    "route_coords": route,
                },
                "sources": ["campus-map"],
            }),
            json!({"type": "done"}),
        ];

        frames.iter().map(sse_record).collect()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(Self::FRAME_DELAY_MS))
    }
}

#[async_trait]
impl QueryTransport for MockBackend {
    async fn open(
        &self,
        query: &Query,
        _cancel: &CancellationSignal,
    ) -> Result<ByteStream, CampusApiError> {
        let delay = self.frame_delay;
        let records: VecDeque<String> = self.script(query).into();

        let chunks = stream::unfold(records, move |mut records| async move {
            let record = records.pop_front()?;
            tokio::time::sleep(delay).await;
            Some((Ok(Bytes::from(record)), records))
        });
        Ok(chunks.boxed())
    }
}

#[async_trait]
impl RouteUpdater for MockBackend {
    async fn update_route(
        &self,
        request: &RouteUpdateRequest,
    ) -> Result<RouteUpdateResponse, CampusApiError> {
        let body = match (request.destination_lat, request.destination_lng) {
            (Some(lat), Some(lng)) => {
                let origin = LatLng::new(request.latitude, request.longitude);
                let destination = LatLng::new(lat, lng);
                json!({
                    "status": "success",
                    "route_coords": straight_route(origin, destination),
                    "distance_remaining": format_distance(distance_meters(origin, destination)),
                    "current_location": origin,
                })
            }
            _ => json!({"status": "error", "message": "destination is required"}),
        };

        serde_json::from_value(body).map_err(CampusApiError::Serde)
    }
}

fn sse_record(frame: &Value) -> String {
    format!("data: {frame}\n\n")
}

fn match_place(text: &str) -> (&'static str, LatLng) {
    let text = text.to_ascii_lowercase();
    PLACES
        .iter()
        .find(|(name, _)| {
            name.to_ascii_lowercase()
                .split_whitespace()
                .any(|word| word != "main" && text.contains(word))
        })
        .copied()
        .unwrap_or(PLACES[0])
}

fn straight_route(origin: LatLng, destination: LatLng) -> Vec<LatLng> {
    let midpoint = LatLng::new(
        (origin.lat + destination.lat) / 2.0,
        (origin.lng + destination.lng) / 2.0,
    );
    vec![origin, midpoint, destination]
}

/// Great-circle distance in meters.
pub fn distance_meters(from: LatLng, to: LatLng) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1}km", meters / 1000.0)
    } else {
        format!("{meters:.0}m")
    }
}
