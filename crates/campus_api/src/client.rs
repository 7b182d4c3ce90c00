use std::future::Future;
use std::pin::Pin;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{info, warn};

use crate::config::CampusApiConfig;
use crate::error::{parse_error_message, CampusApiError};
use crate::headers::{build_headers, RequestKind};
use crate::payload::{Query, RouteUpdateRequest, RouteUpdateResponse};
use crate::retry::{is_retryable_http_error, retry_delay};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

/// Raw body chunks of an open query stream, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, CampusApiError>> + Send>>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
pub struct CampusApiClient {
    http: Client,
    config: CampusApiConfig,
}

impl CampusApiClient {
    pub fn new(config: CampusApiConfig) -> Result<Self, CampusApiError> {
        if !config.base_url.trim().is_empty() {
            reqwest::Url::parse(config.base_url.trim()).map_err(|error| {
                CampusApiError::InvalidBaseUrl(format!("{}: {error}", config.base_url))
            })?;
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(CampusApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CampusApiConfig {
        &self.config
    }

    pub fn build_headers(&self, kind: RequestKind) -> Result<HeaderMap, CampusApiError> {
        let headers = build_headers(&self.config, kind)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    CampusApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    CampusApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_query_request(&self, query: &Query) -> Result<RequestBuilder, CampusApiError> {
        validate_query(query)?;

        let headers = self.build_headers(RequestKind::QueryStream)?;
        Ok(self
            .http
            .get(self.config.query_stream_url())
            .headers(headers)
            .query(&query.to_params()))
    }

    pub fn build_route_update_request(
        &self,
        request: &RouteUpdateRequest,
    ) -> Result<RequestBuilder, CampusApiError> {
        let headers = self.build_headers(RequestKind::RouteUpdate)?;
        let mut builder = self
            .http
            .post(self.config.route_update_url())
            .headers(headers)
            .query(request);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    async fn send_with_retry<B>(
        &self,
        build: B,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, CampusApiError>
    where
        B: Fn() -> Result<RequestBuilder, CampusApiError>,
    {
        let max_retries = self.config.max_retries;
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if is_cancelled(cancellation) {
                return Err(CampusApiError::Cancelled);
            }

            let response = await_or_cancel(build()?.send(), cancellation).await?;

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_default();
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < max_retries && is_retryable_http_error(status.as_u16(), &body) {
                        warn!(%status, attempt, "retrying backend request after error status");
                        self.backoff(attempt, cancellation).await?;
                        continue;
                    }

                    return Err(CampusApiError::Status(status, message));
                }
                Err(error) => {
                    if error.is_builder() {
                        return Err(CampusApiError::Request(error));
                    }

                    last_error = Some(error.to_string());
                    if attempt < max_retries {
                        warn!(%error, attempt, "retrying backend request after transport error");
                        self.backoff(attempt, cancellation).await?;
                        continue;
                    }
                    if max_retries == 0 {
                        return Err(CampusApiError::Request(error));
                    }
                }
            }
        }

        Err(CampusApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    async fn backoff(
        &self,
        attempt: u32,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<(), CampusApiError> {
        let delay = retry_delay(self.config.retry_base_delay, attempt);
        await_or_cancel(tokio::time::sleep(delay), cancellation).await
    }

    /// Opens the streamed query endpoint and returns its raw body chunks.
    ///
    /// Cancellation is honored while connecting; once the stream is returned
    /// the caller closes it by dropping it.
    pub async fn open_query_stream(
        &self,
        query: &Query,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<ByteStream, CampusApiError> {
        let response = self
            .send_with_retry(|| self.build_query_request(query), cancellation)
            .await?;
        info!(status = %response.status(), "query stream opened");

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(CampusApiError::from))
            .boxed())
    }

    /// Posts one position to the route update endpoint.
    pub async fn update_route(
        &self,
        request: &RouteUpdateRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<RouteUpdateResponse, CampusApiError> {
        let response = self
            .send_with_retry(|| self.build_route_update_request(request), cancellation)
            .await?;
        let body = await_or_cancel(response.bytes(), cancellation).await??;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn validate_query(query: &Query) -> Result<(), CampusApiError> {
    if query.text.trim().is_empty() {
        return Err(CampusApiError::InvalidQuery(
            "query text must not be empty".to_owned(),
        ));
    }

    if let Some(location) = query.location {
        if !location.lat.is_finite() || !location.lng.is_finite() {
            return Err(CampusApiError::InvalidQuery(format!(
                "query location must be finite, got ({}, {})",
                location.lat, location.lng
            )));
        }
    }

    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, CampusApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(CampusApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(CampusApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
