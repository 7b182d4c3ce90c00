use campus_api::url::{DEFAULT_BASE_URL, DEFAULT_QUERY_STREAM_PATH, DEFAULT_ROUTE_UPDATE_PATH};
use campus_api::{join_endpoint, CampusApiConfig};

#[test]
fn join_endpoint_normalizes_slashes() {
    assert_eq!(
        join_endpoint("http://campus.local/", "/api/ai/query/stream"),
        "http://campus.local/api/ai/query/stream"
    );
    assert_eq!(
        join_endpoint("http://campus.local", "api/location/update"),
        "http://campus.local/api/location/update"
    );
}

#[test]
fn join_endpoint_keeps_base_that_already_has_path() {
    assert_eq!(
        join_endpoint("http://campus.local/api/ai/query/stream", DEFAULT_QUERY_STREAM_PATH),
        "http://campus.local/api/ai/query/stream"
    );
}

#[test]
fn join_endpoint_defaults_empty_base() {
    assert_eq!(
        join_endpoint("  ", DEFAULT_ROUTE_UPDATE_PATH),
        format!("{DEFAULT_BASE_URL}{DEFAULT_ROUTE_UPDATE_PATH}")
    );
}

#[test]
fn config_builds_both_endpoint_urls() {
    let config = CampusApiConfig::new("https://nav.example.edu/")
        .with_route_update_path("/v2/location/update");
    assert_eq!(
        config.query_stream_url(),
        "https://nav.example.edu/api/ai/query/stream"
    );
    assert_eq!(
        config.route_update_url(),
        "https://nav.example.edu/v2/location/update"
    );
}
