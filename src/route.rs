//! Route recalculation driven by location samples.
//!
//! Each due sample issues one route update tagged with a strictly increasing
//! sequence number. Responses may resolve in any order; only a response newer
//! than the last applied one touches [`RouteState`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campus_api::{
    CampusApiClient, CampusApiError, LatLng, RouteUpdateRequest, RouteUpdateResponse, TravelMode,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::RecalculationError;
use crate::location::LocationSample;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Posts one position to the routing backend.
#[async_trait]
pub trait RouteUpdater: Send + Sync {
    async fn update_route(
        &self,
        request: &RouteUpdateRequest,
    ) -> Result<RouteUpdateResponse, CampusApiError>;
}

#[async_trait]
impl RouteUpdater for CampusApiClient {
    async fn update_route(
        &self,
        request: &RouteUpdateRequest,
    ) -> Result<RouteUpdateResponse, CampusApiError> {
        CampusApiClient::update_route(self, request, None).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub coord: LatLng,
    pub name: Option<String>,
}

impl Destination {
    pub fn new(coord: LatLng) -> Self {
        Self { coord, name: None }
    }

    pub fn named(coord: LatLng, name: impl Into<String>) -> Self {
        Self {
            coord,
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteState {
    pub coordinates: Vec<LatLng>,
    pub distance_remaining: Option<String>,
    pub destination: Option<Destination>,
    pub last_applied_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecalculationConfig {
    pub min_interval: Duration,
    pub mode: TravelMode,
}

impl Default for RecalculationConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            mode: TravelMode::Walking,
        }
    }
}

/// What [`RouteRecalculationLoop::on_sample`] did with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDisposition {
    Issued(u64),
    /// Within the throttle window; a trailing request is armed.
    Throttled,
    NoDestination,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteUpdate {
    /// The trailing timer fired and issued a request.
    Issued { seq: u64 },
    Applied { seq: u64 },
    /// Resolved after a newer response was already applied.
    Stale { seq: u64 },
    Failed { seq: u64, error: RecalculationError },
}

struct Completion {
    seq: u64,
    epoch: u64,
    result: Result<RouteUpdateResponse, CampusApiError>,
}

pub struct RouteRecalculationLoop {
    updater: Arc<dyn RouteUpdater>,
    config: RecalculationConfig,
    state: RouteState,
    position: Option<LocationSample>,
    last_seq: u64,
    epoch: u64,
    last_issued_at: Option<Instant>,
    trailing_at: Option<Instant>,
    in_flight: Vec<JoinHandle<()>>,
    sender: UnboundedSender<Completion>,
    receiver: UnboundedReceiver<Completion>,
}

impl RouteRecalculationLoop {
    pub fn new(updater: Arc<dyn RouteUpdater>, config: RecalculationConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            updater,
            config,
            state: RouteState::default(),
            position: None,
            last_seq: 0,
            epoch: 0,
            last_issued_at: None,
            trailing_at: None,
            in_flight: Vec::new(),
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> &RouteState {
        &self.state
    }

    /// Latest sample seen, throttled or not.
    pub fn current_position(&self) -> Option<&LocationSample> {
        self.position.as_ref()
    }

    pub fn config(&self) -> &RecalculationConfig {
        &self.config
    }

    pub fn set_mode(&mut self, mode: TravelMode) {
        self.config.mode = mode;
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.iter().filter(|task| !task.is_finished()).count()
    }

    /// Replaces the destination. Responses for the previous destination are
    /// discarded; `None` clears the route.
    pub fn set_destination(&mut self, destination: Option<Destination>) {
        self.discard_pending();
        self.last_issued_at = None;
        self.state.coordinates.clear();
        self.state.distance_remaining = None;
        self.state.destination = destination;

        match &self.state.destination {
            Some(destination) => info!(
                lat = destination.coord.lat,
                lng = destination.coord.lng,
                "route destination set"
            ),
            None => info!("route destination cleared"),
        }
    }

    /// Records a sample and issues a request when one is due.
    pub fn on_sample(&mut self, sample: LocationSample) -> SampleDisposition {
        self.position = Some(sample);
        if self.state.destination.is_none() {
            return SampleDisposition::NoDestination;
        }

        let now = Instant::now();
        match self.last_issued_at {
            Some(last) if now.duration_since(last) < self.config.min_interval => {
                if self.trailing_at.is_none() {
                    self.trailing_at = Some(last + self.config.min_interval);
                }
                debug!("route update throttled");
                SampleDisposition::Throttled
            }
            _ => self
                .issue(now)
                .map_or(SampleDisposition::NoDestination, SampleDisposition::Issued),
        }
    }

    /// Waits for the next response or trailing-timer firing.
    ///
    /// Cancel-safe. Pends forever while nothing is in flight or armed.
    pub async fn next_update(&mut self) -> RouteUpdate {
        loop {
            let trailing_at = self.trailing_at;
            tokio::select! {
                Some(completion) = self.receiver.recv() => {
                    if let Some(update) = self.complete(completion) {
                        return update;
                    }
                }
                _ = tokio::time::sleep_until(trailing_at.unwrap_or_else(Instant::now)), if trailing_at.is_some() => {
                    self.trailing_at = None;
                    if let Some(seq) = self.issue(Instant::now()) {
                        return RouteUpdate::Issued { seq };
                    }
                }
            }
        }
    }

    /// Cancels in-flight requests and the trailing timer. Idempotent; a
    /// later sample resumes issuing.
    pub fn stop(&mut self) {
        self.discard_pending();
        self.last_issued_at = None;
    }

    fn discard_pending(&mut self) {
        for task in self.in_flight.drain(..) {
            task.abort();
        }
        self.trailing_at = None;
        self.epoch += 1;
    }

    fn issue(&mut self, now: Instant) -> Option<u64> {
        let position = self.position?;
        let destination = self.state.destination.as_ref()?;

        self.last_seq += 1;
        let seq = self.last_seq;
        let request = RouteUpdateRequest {
            latitude: position.lat,
            longitude: position.lng,
            destination_lat: Some(destination.coord.lat),
            destination_lng: Some(destination.coord.lng),
            destination_name: destination.name.clone(),
            mode: self.config.mode,
        };

        let updater = Arc::clone(&self.updater);
        let sender = self.sender.clone();
        let epoch = self.epoch;
        self.in_flight.retain(|task| !task.is_finished());
        self.in_flight.push(tokio::spawn(async move {
            let result = updater.update_route(&request).await;
            let _ = sender.send(Completion { seq, epoch, result });
        }));

        self.last_issued_at = Some(now);
        self.trailing_at = None;
        debug!(seq, "route update issued");
        Some(seq)
    }

    fn complete(&mut self, completion: Completion) -> Option<RouteUpdate> {
        let Completion { seq, epoch, result } = completion;
        if epoch != self.epoch {
            debug!(seq, "discarding route response from a stopped or replaced route");
            return None;
        }
        if seq <= self.state.last_applied_seq {
            debug!(seq, last_applied = self.state.last_applied_seq, "discarding stale route response");
            return Some(RouteUpdate::Stale { seq });
        }

        match validate(result) {
            Ok(response) => {
                self.state.coordinates = response.route_coords;
                self.state.distance_remaining = response.distance_remaining;
                self.state.last_applied_seq = seq;
                info!(seq, points = self.state.coordinates.len(), "route updated");
                Some(RouteUpdate::Applied { seq })
            }
            Err(error) => {
                warn!(seq, %error, "route recalculation failed");
                Some(RouteUpdate::Failed { seq, error })
            }
        }
    }
}

impl Drop for RouteRecalculationLoop {
    fn drop(&mut self) {
        for task in self.in_flight.drain(..) {
            task.abort();
        }
    }
}

fn validate(
    result: Result<RouteUpdateResponse, CampusApiError>,
) -> Result<RouteUpdateResponse, RecalculationError> {
    let response = result.map_err(|error| RecalculationError::Transport(error.to_string()))?;
    if !response.is_success() {
        let message = response
            .message
            .clone()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("status {}", response.status));
        return Err(RecalculationError::Rejected(message));
    }
    if response.route_coords.is_empty() {
        return Err(RecalculationError::EmptyRoute);
    }

    Ok(response)
}
