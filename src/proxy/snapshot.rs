//! Immutable projections of one proxied exchange.

use std::io::Read;

use axum::http::{header, request::Parts, HeaderMap, HeaderName, Method};

/// What the client asked for, frozen before handler invocation.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// Destination host as the client named it.
    pub host: String,
    /// Request target: path plus query.
    pub target: String,
    pub method: Method,
    pub user_agent: String,
    pub content_type: String,
    /// The client asked for the connection to close after this exchange.
    pub connection_close: bool,
    /// The inbound connection carried transport security.
    pub https: bool,
}

impl RequestSnapshot {
    /// Project the inbound request metadata. The parts themselves are read,
    /// never mutated.
    pub fn from_parts(parts: &Parts, host: &str, https: bool) -> Self {
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        Self {
            host: host.to_string(),
            target,
            method: parts.method.clone(),
            user_agent: header_str(&parts.headers, header::USER_AGENT),
            content_type: header_str(&parts.headers, header::CONTENT_TYPE),
            connection_close: parts
                .headers
                .get(header::CONNECTION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.eq_ignore_ascii_case("close")),
            https,
        }
    }
}

/// Normalized view of the upstream response.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub content_type: String,
}

/// One decoded exchange, alive for a single handler invocation.
///
/// Owns no resources: the body reader borrows the pooled capture buffer,
/// which outlives the handler call and is recycled right after.
pub struct Exchange<'a> {
    pub request: &'a RequestSnapshot,
    pub response: &'a ResponseSnapshot,
    pub body: &'a mut dyn Read,
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
