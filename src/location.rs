//! Continuous geolocation sampling with the campus-bounds fallback policy.
//!
//! Raw positions come from a [`GeolocationSource`]. Every position is turned
//! into a [`LocationSample`]: in-bounds fixes pass through, anything outside
//! the campus box is replaced by the fallback coordinate, and denial or a
//! missing capability yields one fallback sample before the watch ends.

use std::pin::Pin;
use std::sync::Arc;

use campus_api::LatLng;
use futures_util::{Stream, StreamExt};
use time::OffsetDateTime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::GeolocationError;

/// Reference coordinate used whenever no trustworthy fix exists.
pub const DEFAULT_COORDINATE: LatLng = LatLng::new(8.55686, 39.29108);

pub const CAMPUS_BOUNDS: CampusBounds = CampusBounds {
    min_lat: 8.5400,
    max_lat: 8.5720,
    min_lng: 39.2600,
    max_lng: 39.3000,
};

/// One position report from the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPosition {
    pub lat: f64,
    pub lng: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
    pub timestamp: Option<OffsetDateTime>,
}

impl RawPosition {
    pub fn new(lat: f64, lng: f64, accuracy: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy,
            timestamp: None,
        }
    }
}

pub type PositionStream = Pin<Box<dyn Stream<Item = Result<RawPosition, GeolocationError>> + Send>>;

/// Platform geolocation capability.
pub trait GeolocationSource: Send + Sync {
    /// Starts a continuous watch. Fails with
    /// [`GeolocationError::Unsupported`] when the capability is absent.
    fn watch_position(&self) -> Result<PositionStream, GeolocationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStatus {
    Actual,
    OutsideBounds,
    Denied,
    UnsupportedDefault,
}

impl LocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actual => "actual",
            Self::OutsideBounds => "outside-bounds",
            Self::Denied => "denied",
            Self::UnsupportedDefault => "unsupported-default",
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Actual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub lat: f64,
    pub lng: f64,
    /// `None` for fallback samples that carry no real fix.
    pub accuracy: Option<f64>,
    pub timestamp: OffsetDateTime,
    pub status: LocationStatus,
}

impl LocationSample {
    pub fn coord(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CampusBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl CampusBounds {
    pub fn contains(&self, coord: LatLng) -> bool {
        (self.min_lat..=self.max_lat).contains(&coord.lat)
            && (self.min_lng..=self.max_lng).contains(&coord.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub bounds: CampusBounds,
    pub fallback: LatLng,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bounds: CAMPUS_BOUNDS,
            fallback: DEFAULT_COORDINATE,
        }
    }
}

impl TrackerConfig {
    /// Applies the bounds policy to one raw fix.
    pub fn classify(&self, raw: &RawPosition) -> LocationSample {
        let timestamp = raw.timestamp.unwrap_or_else(OffsetDateTime::now_utc);
        let coord = LatLng::new(raw.lat, raw.lng);

        if raw.lat.is_finite() && raw.lng.is_finite() && self.bounds.contains(coord) {
            return LocationSample {
                lat: raw.lat,
                lng: raw.lng,
                accuracy: Some(raw.accuracy),
                timestamp,
                status: LocationStatus::Actual,
            };
        }

        debug!(lat = raw.lat, lng = raw.lng, "fix outside campus bounds; using fallback");
        LocationSample {
            lat: self.fallback.lat,
            lng: self.fallback.lng,
            accuracy: Some(raw.accuracy),
            timestamp,
            status: LocationStatus::OutsideBounds,
        }
    }

    pub fn fallback_sample(&self, status: LocationStatus) -> LocationSample {
        LocationSample {
            lat: self.fallback.lat,
            lng: self.fallback.lng,
            accuracy: None,
            timestamp: OffsetDateTime::now_utc(),
            status,
        }
    }

    /// Fallback for a fatal geolocation error; `None` for transient ones.
    fn fallback_for(&self, error: &GeolocationError) -> Option<LocationSample> {
        match error {
            GeolocationError::PermissionDenied => Some(self.fallback_sample(LocationStatus::Denied)),
            GeolocationError::Unsupported => {
                Some(self.fallback_sample(LocationStatus::UnsupportedDefault))
            }
            GeolocationError::Unavailable(_) | GeolocationError::Timeout => None,
        }
    }
}

/// Keeps at most one geolocation watch alive and turns its output into
/// classified samples.
pub struct LocationTracker {
    source: Arc<dyn GeolocationSource>,
    config: TrackerConfig,
    watch: Option<JoinHandle<()>>,
}

impl LocationTracker {
    pub fn new(source: Arc<dyn GeolocationSource>) -> Self {
        Self::with_config(source, TrackerConfig::default())
    }

    pub fn with_config(source: Arc<dyn GeolocationSource>, config: TrackerConfig) -> Self {
        Self {
            source,
            config,
            watch: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn is_watching(&self) -> bool {
        self.watch.as_ref().is_some_and(|watch| !watch.is_finished())
    }

    /// Starts sampling, stopping any previous watch first. The receiver ends
    /// when the watch ends. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> UnboundedReceiver<LocationSample> {
        self.stop();
        let (sender, receiver) = mpsc::unbounded_channel();

        match self.source.watch_position() {
            Ok(positions) => {
                info!("geolocation watch started");
                self.watch = Some(tokio::spawn(watch(positions, self.config, sender)));
            }
            Err(error) => {
                warn!(%error, "geolocation watch unavailable; using fallback coordinate");
                let sample = self
                    .config
                    .fallback_for(&error)
                    .unwrap_or_else(|| self.config.fallback_sample(LocationStatus::UnsupportedDefault));
                let _ = sender.send(sample);
            }
        }

        receiver
    }

    /// Releases the watch. Idempotent; safe before `start`.
    pub fn stop(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.abort();
            debug!("geolocation watch stopped");
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn watch(
    mut positions: PositionStream,
    config: TrackerConfig,
    sender: UnboundedSender<LocationSample>,
) {
    while let Some(position) = positions.next().await {
        let sample = match position {
            Ok(raw) => config.classify(&raw),
            Err(error) => match config.fallback_for(&error) {
                Some(sample) => {
                    warn!(%error, "geolocation ended; using fallback coordinate");
                    let _ = sender.send(sample);
                    return;
                }
                None => {
                    warn!(%error, "transient geolocation error");
                    continue;
                }
            },
        };

        if sender.send(sample).is_err() {
            return;
        }
    }
    debug!("geolocation source closed");
}
