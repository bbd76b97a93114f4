//! Single request/response lifecycle orchestration.
//!
//! One call to [`ProxyEngine::serve`] runs a request from adaptation through
//! upstream dispatch, fan-out streaming, decode, and handler hand-off. All
//! per-request state is owned by that call; the engine itself only holds the
//! process-wide collaborators (client, resolver, handler, buffer pools).

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode};

use crate::buffer::{BufferPools, PooledBuffer, SizeClass};
use crate::decode::{self, Encoding};
use crate::error::ProxyError;
use crate::handler::ExchangeHandler;
use crate::observability::metrics;
use crate::proxy::adapter;
use crate::proxy::snapshot::{Exchange, RequestSnapshot, ResponseSnapshot};
use crate::proxy::tee::TeeBody;
use crate::resolver::{HostResolver, ResolveError};

/// Size class used for response capture.
const CAPTURE_CLASS: SizeClass = SizeClass::Large;

/// Orchestrates one proxied exchange per call.
pub struct ProxyEngine {
    client: reqwest::Client,
    resolver: Arc<dyn HostResolver>,
    handler: Arc<dyn ExchangeHandler>,
    pools: Arc<BufferPools>,
    /// Inbound connections to this engine carry transport security.
    secure: bool,
}

impl ProxyEngine {
    pub fn new(
        resolver: Arc<dyn HostResolver>,
        handler: Arc<dyn ExchangeHandler>,
        pools: Arc<BufferPools>,
        secure: bool,
    ) -> Result<Self, reqwest::Error> {
        // The caller must see raw redirect responses; never follow them.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            resolver,
            handler,
            pools,
            secure,
        })
    }

    /// Run one request through the full lifecycle.
    ///
    /// Adaptation and dispatch failures come back as a 500 carrying the
    /// error text; everything after the upstream answers streams through.
    pub async fn serve(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let method = request.method().clone();

        match self.proxy(request).await {
            Ok(response) => {
                metrics::record_request(method.as_str(), response.status().as_u16(), start);
                response
            }
            Err(e) => {
                tracing::error!(method = %method, error = %e, "proxy request failed");
                metrics::record_request(
                    method.as_str(),
                    StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    start,
                );
                error_response(&e)
            }
        }
    }

    async fn proxy(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let (parts, body) = request.into_parts();

        let host = adapter::inbound_host(&parts).ok_or_else(|| ProxyError::Resolution {
            host: String::new(),
            source: ResolveError::MissingHost,
        })?;
        let uri = adapter::adapt_uri(&parts, &host, self.secure, self.resolver.as_ref()).await?;
        let url: reqwest::Url = uri.to_string().parse().map_err(|_| ProxyError::Resolution {
            host: host.clone(),
            source: ResolveError::BadAddress(uri.to_string()),
        })?;

        tracing::debug!(host = %host, uri = %uri, method = %parts.method, "request adapted");

        // Outbound call: fresh absolute target, verbatim headers, the
        // inbound body streamed through. One attempt, no retries.
        let upstream = self
            .client
            .request(parts.method.clone(), url)
            .headers(parts.headers.clone())
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .send()
            .await?;

        let status = upstream.status();
        let headers = coalesce_headers(upstream.headers());
        let content_type = upstream
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let content_encoding = upstream
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(status = %status, encoding = ?content_encoding, "upstream answered");

        let request_snapshot = RequestSnapshot::from_parts(&parts, &host, self.secure);
        let capture = self.pools.get(CAPTURE_CLASS).acquire();
        let handler = Arc::clone(&self.handler);
        let complete = move |capture: PooledBuffer| {
            finish_exchange(request_snapshot, content_type, content_encoding, capture, handler);
        };

        let tee = TeeBody::new(
            Body::from_stream(upstream.bytes_stream()),
            capture,
            Box::new(complete),
        );

        let mut response = Response::new(Body::new(tee));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// End-of-stream bookkeeping: decode the captured copy, hand the exchange to
/// the handler, release the buffer. A decode failure is logged and the
/// handler sees the raw bytes; the client response is already on the wire
/// either way.
fn finish_exchange(
    request: RequestSnapshot,
    content_type: String,
    content_encoding: Option<String>,
    capture: PooledBuffer,
    handler: Arc<dyn ExchangeHandler>,
) {
    let encoding = Encoding::from_token(content_encoding.as_deref());
    let body = capture.as_slice();
    let mut reader: Box<dyn std::io::Read + '_> = match decode::reader(encoding, body) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::error!(error = %e, ?encoding, "response decode failed; handing off raw bytes");
            Box::new(body)
        }
    };

    let response = ResponseSnapshot { content_type };
    let mut exchange = Exchange {
        request: &request,
        response: &response,
        body: reader.as_mut(),
    };
    handler.handle(&mut exchange);

    tracing::debug!(
        https = request.https,
        host = %request.host,
        method = %request.method,
        target = %request.target,
        content_type = %response.content_type,
        captured_bytes = capture.len(),
        "exchange handed off"
    );
    // `capture` drops here: truncated and back to its pool.
}

/// Re-emit upstream headers. A single-valued header passes through verbatim;
/// two or more values are concatenated into one value with no separator.
fn coalesce_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.keys_len());
    for name in upstream.keys() {
        let values: Vec<&HeaderValue> = upstream.get_all(name).iter().collect();
        if values.len() == 1 {
            headers.insert(name.clone(), values[0].clone());
            continue;
        }
        let mut joined = Vec::new();
        for value in &values {
            joined.extend_from_slice(value.as_bytes());
        }
        match HeaderValue::from_bytes(&joined) {
            Ok(value) => {
                headers.insert(name.clone(), value);
            }
            Err(e) => {
                tracing::warn!(header = %name, error = %e, "dropping header that cannot be coalesced");
            }
        }
    }
    headers
}

/// Terminal failures surface as a 500 carrying the error text.
fn error_response(error: &ProxyError) -> Response<Body> {
    let mut response = Response::new(Body::from(error.to_string()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderName;
    use http_body_util::BodyExt;

    use super::*;
    use crate::handler::LogHandler;
    use crate::resolver::StaticResolver;

    #[test]
    fn multi_valued_headers_concatenate_without_separator() {
        let mut upstream = HeaderMap::new();
        let trace = HeaderName::from_static("x-trace");
        upstream.append(trace.clone(), HeaderValue::from_static("a"));
        upstream.append(trace.clone(), HeaderValue::from_static("b"));
        upstream.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );

        let out = coalesce_headers(&upstream);
        assert_eq!(out.get(&trace).unwrap(), "ab");
        assert_eq!(out.get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(out.get_all(&trace).iter().count(), 1);
    }

    #[tokio::test]
    async fn resolution_failure_is_a_500_and_acquires_no_buffer() {
        let pools = Arc::new(BufferPools::new());
        let engine = ProxyEngine::new(
            Arc::new(StaticResolver::new(Vec::new())),
            Arc::new(LogHandler),
            Arc::clone(&pools),
            false,
        )
        .unwrap();

        let request = Request::builder()
            .uri("/")
            .header("host", "bad.example")
            .body(Body::empty())
            .unwrap();
        let response = engine.serve(request).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("bad.example"), "{text}");
        // Never acquired: a released buffer would sit in the free list.
        assert_eq!(pools.get(CAPTURE_CLASS).available(), 0);
    }

    #[tokio::test]
    async fn missing_host_is_a_500() {
        let engine = ProxyEngine::new(
            Arc::new(StaticResolver::new(vec!["10.0.0.1:80".to_string()])),
            Arc::new(LogHandler),
            Arc::new(BufferPools::new()),
            false,
        )
        .unwrap();

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = engine.serve(request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
