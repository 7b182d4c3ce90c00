use thiserror::Error;

/// Terminal failure of a query session. Every variant collapses into the
/// single error outcome of the session; none of them is raised to callers.
///
/// Malformed frames never reach this type: the parser logs and drops them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The stream could not be opened (connect failure, non-success status).
    #[error("{0}")]
    Transport(String),
    /// The backend sent an explicit `error` frame.
    #[error("{0}")]
    Upstream(String),
    /// The stream ended before an answer or error frame arrived.
    #[error("connection lost")]
    ConnectionLost,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("position request timed out")]
    Timeout,
    #[error("geolocation is not supported")]
    Unsupported,
}

impl GeolocationError {
    /// Denial and missing capability end the watch; the others are transient.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Unsupported)
    }
}

/// Failed route recalculation. Logged by the loop; route state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecalculationError {
    #[error("route update request failed: {0}")]
    Transport(String),
    #[error("route update rejected: {0}")]
    Rejected(String),
    #[error("route update returned an empty route")]
    EmptyRoute,
}
