/// Default backend base URL (local development server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";
/// Streamed AI query endpoint path.
///
/// The client issues a `GET` with the query in the URL. The stock backend
/// only accepts `POST` with a JSON body on this route, so deployments need a
/// GET-compatible proxy in front of it or a different path set through
/// [`CampusApiConfig::with_query_stream_path`](crate::CampusApiConfig::with_query_stream_path).
pub const DEFAULT_QUERY_STREAM_PATH: &str = "/api/ai/query/stream";
/// Location/route update endpoint path.
pub const DEFAULT_ROUTE_UPDATE_PATH: &str = "/api/location/update";

/// Join a base URL and an endpoint path.
///
/// Normalization rules:
/// 1) an empty base falls back to [`DEFAULT_BASE_URL`]
/// 2) a base that already ends with `path` is returned unchanged
/// 3) otherwise exactly one `/` separates base and path
pub fn join_endpoint(base: &str, path: &str) -> String {
    let base = if base.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        base.trim()
    };

    let trimmed = base.trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        return trimmed.to_string();
    }
    if trimmed.ends_with(&format!("/{path}")) {
        return trimmed.to_string();
    }
    format!("{trimmed}/{path}")
}
