use std::sync::Arc;

use campus_nav::{
    CampusApiClient, CampusApiConfig, GeolocationSource, LatLng, QueryTransport, RouteUpdater,
};

mod location;
mod mock;

pub use location::{DeniedGeolocation, FixedGeolocation, NoGeolocation};
pub use mock::{distance_meters, MockBackend, PLACES};

pub const DEFAULT_BACKEND_ID: &str = "http";
pub const MOCK_BACKEND_ID: &str = "mock";
pub const BACKEND_ENV_VAR: &str = "CAMPUS_NAV_BACKEND";

/// Everything the app talks to outside the process.
#[derive(Clone)]
pub struct Backend {
    pub transport: Arc<dyn QueryTransport>,
    pub updater: Arc<dyn RouteUpdater>,
    pub geolocation: Arc<dyn GeolocationSource>,
}

/// Where positions come from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LocationChoice {
    #[default]
    Unsupported,
    Fixed(LatLng),
    Denied,
}

impl LocationChoice {
    pub fn source(self) -> Arc<dyn GeolocationSource> {
        match self {
            Self::Unsupported => Arc::new(NoGeolocation),
            Self::Fixed(position) => {
                Arc::new(FixedGeolocation::new(position, FixedGeolocation::DEFAULT_INTERVAL))
            }
            Self::Denied => Arc::new(DeniedGeolocation),
        }
    }
}

/// Resolves the backend id from `CAMPUS_NAV_BACKEND` unless `force_mock`.
pub fn backend_from_env(
    force_mock: bool,
    api: CampusApiConfig,
    location: LocationChoice,
) -> Result<Backend, String> {
    let backend_id = std::env::var(BACKEND_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let backend_id = if force_mock {
        MOCK_BACKEND_ID
    } else {
        backend_id.as_deref().unwrap_or(DEFAULT_BACKEND_ID)
    };

    backend_for_id(backend_id, api, location)
}

pub fn backend_for_id(
    backend_id: &str,
    api: CampusApiConfig,
    location: LocationChoice,
) -> Result<Backend, String> {
    let geolocation = location.source();
    match backend_id {
        DEFAULT_BACKEND_ID => {
            let client = Arc::new(CampusApiClient::new(api).map_err(|error| error.to_string())?);
            Ok(Backend {
                transport: client.clone(),
                updater: client,
                geolocation,
            })
        }
        MOCK_BACKEND_ID => {
            let mock = Arc::new(MockBackend::default());
            Ok(Backend {
                transport: mock.clone(),
                updater: mock,
                geolocation,
            })
        }
        unknown => Err(format!(
            "Unsupported backend '{unknown}'. Available backends: {DEFAULT_BACKEND_ID}, {MOCK_BACKEND_ID}"
        )),
    }
}
