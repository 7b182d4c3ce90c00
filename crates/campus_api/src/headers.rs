use std::collections::BTreeMap;

use crate::config::CampusApiConfig;
use crate::error::CampusApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CACHE_CONTROL: &str = "cache-control";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const ACCEPT_EVENT_STREAM: &str = "text/event-stream";
pub const ACCEPT_JSON: &str = "application/json";

/// Which endpoint the headers are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    QueryStream,
    RouteUpdate,
}

/// Build a deterministic header map for backend requests.
pub fn build_headers(
    config: &CampusApiConfig,
    kind: RequestKind,
) -> Result<BTreeMap<String, String>, CampusApiError> {
    let mut headers = BTreeMap::new();

    match kind {
        RequestKind::QueryStream => {
            headers.insert(HEADER_ACCEPT.to_owned(), ACCEPT_EVENT_STREAM.to_owned());
            headers.insert(HEADER_CACHE_CONTROL.to_owned(), "no-cache".to_owned());
        }
        RequestKind::RouteUpdate => {
            headers.insert(HEADER_ACCEPT.to_owned(), ACCEPT_JSON.to_owned());
        }
    }

    let ua = config
        .user_agent
        .as_deref()
        .and_then(sanitize_nonempty)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(CampusApiError::InvalidHeader(
                "header name must not be empty".to_owned(),
            ));
        }
        headers.insert(key, value.trim().to_owned());
    }

    Ok(headers)
}

fn sanitize_nonempty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn default_user_agent() -> String {
    format!(
        "campus-nav/{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
