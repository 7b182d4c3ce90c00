use std::time::Duration;

use campus_nav::{GeolocationError, GeolocationSource, LatLng, PositionStream, RawPosition};
use futures_util::{stream, StreamExt};
use time::OffsetDateTime;

/// Reports the same fix on a fixed interval, starting immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedGeolocation {
    position: LatLng,
    accuracy: f64,
    interval: Duration,
}

impl FixedGeolocation {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
    const ACCURACY_M: f64 = 10.0;

    pub fn new(position: LatLng, interval: Duration) -> Self {
        Self {
            position,
            accuracy: Self::ACCURACY_M,
            interval,
        }
    }
}

impl GeolocationSource for FixedGeolocation {
    fn watch_position(&self) -> Result<PositionStream, GeolocationError> {
        let fix = *self;
        let positions = stream::unfold(true, move |first| async move {
            if !first {
                tokio::time::sleep(fix.interval).await;
            }
            let position = RawPosition {
                timestamp: Some(OffsetDateTime::now_utc()),
                ..RawPosition::new(fix.position.lat, fix.position.lng, fix.accuracy)
            };
            Some((Ok(position), false))
        });
        Ok(positions.boxed())
    }
}

/// Permission prompt that is always refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedGeolocation;

impl GeolocationSource for DeniedGeolocation {
    fn watch_position(&self) -> Result<PositionStream, GeolocationError> {
        Ok(stream::iter([Err(GeolocationError::PermissionDenied)]).boxed())
    }
}

/// Host without a geolocation capability; a terminal has none by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

impl GeolocationSource for NoGeolocation {
    fn watch_position(&self) -> Result<PositionStream, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}
