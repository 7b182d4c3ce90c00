use campus_api::headers::{
    build_headers, RequestKind, ACCEPT_EVENT_STREAM, ACCEPT_JSON, HEADER_ACCEPT,
    HEADER_CACHE_CONTROL, HEADER_USER_AGENT,
};
use campus_api::{CampusApiConfig, CampusApiError};

#[test]
fn query_stream_headers_accept_event_stream() {
    let config = CampusApiConfig::default().insert_header("X-Campus-Client", "kiosk-3");

    let headers = build_headers(&config, RequestKind::QueryStream).expect("header construction");
    assert_eq!(
        headers.get(HEADER_ACCEPT).expect("accept"),
        ACCEPT_EVENT_STREAM
    );
    assert_eq!(
        headers.get(HEADER_CACHE_CONTROL).expect("cache-control"),
        "no-cache"
    );
    assert_eq!(
        headers.get("x-campus-client").expect("custom header lowercased"),
        "kiosk-3"
    );
    assert!(headers
        .get(HEADER_USER_AGENT)
        .expect("default user agent")
        .starts_with("campus-nav/"));
}

#[test]
fn route_update_headers_accept_json() {
    let config = CampusApiConfig::default();
    let headers = build_headers(&config, RequestKind::RouteUpdate).expect("header construction");
    assert_eq!(headers.get(HEADER_ACCEPT).expect("accept"), ACCEPT_JSON);
    assert!(!headers.contains_key(HEADER_CACHE_CONTROL));
}

#[test]
fn header_map_prefers_configured_user_agent() {
    let config = CampusApiConfig::default().with_user_agent("  test-agent ");
    let headers = build_headers(&config, RequestKind::QueryStream).expect("header construction");
    assert_eq!(
        headers.get(HEADER_USER_AGENT).expect("user-agent"),
        "test-agent"
    );
}

#[test]
fn empty_custom_header_name_is_rejected() {
    let config = CampusApiConfig::default().insert_header("  ", "value");
    let error = build_headers(&config, RequestKind::RouteUpdate).expect_err("empty header name");
    assert!(matches!(error, CampusApiError::InvalidHeader(_)));
}
