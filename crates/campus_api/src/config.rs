use std::collections::BTreeMap;
use std::time::Duration;

use crate::retry::{BASE_DELAY_MS, MAX_RETRIES};
use crate::url::{
    join_endpoint, DEFAULT_BASE_URL, DEFAULT_QUERY_STREAM_PATH, DEFAULT_ROUTE_UPDATE_PATH,
};

/// Transport configuration for backend requests.
#[derive(Debug, Clone)]
pub struct CampusApiConfig {
    /// Base URL of the navigation backend.
    pub base_url: String,
    /// Path of the streamed query endpoint.
    pub query_stream_path: String,
    /// Path of the route update endpoint.
    pub route_update_path: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional whole-request timeout. Applied to route updates only; a
    /// streamed query stays open as long as the backend keeps it open.
    pub timeout: Option<Duration>,
    /// Optional connect timeout applied to every request.
    pub connect_timeout: Option<Duration>,
    /// Retry attempts after the initial attempt for transient failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt.
    pub retry_base_delay: Duration,
}

impl Default for CampusApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            query_stream_path: DEFAULT_QUERY_STREAM_PATH.to_string(),
            route_update_path: DEFAULT_ROUTE_UPDATE_PATH.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
            connect_timeout: None,
            max_retries: MAX_RETRIES,
            retry_base_delay: Duration::from_millis(BASE_DELAY_MS),
        }
    }
}

impl CampusApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_query_stream_path(mut self, path: impl Into<String>) -> Self {
        self.query_stream_path = path.into();
        self
    }

    pub fn with_route_update_path(mut self, path: impl Into<String>) -> Self {
        self.route_update_path = path.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }

    pub fn query_stream_url(&self) -> String {
        join_endpoint(&self.base_url, &self.query_stream_path)
    }

    pub fn route_update_url(&self) -> String {
        join_endpoint(&self.base_url, &self.route_update_path)
    }
}
