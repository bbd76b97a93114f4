//! Inbound request adaptation.
//!
//! Rewrites one client request into its outbound form: resolve the host,
//! pick the scheme from the inbound transport, point the authority at the
//! first resolved address, and rebuild the target in absolute form so no
//! inbound-only request line survives. The inbound metadata is read, never
//! mutated, since snapshot construction still needs it afterwards.

use axum::http::{header, request::Parts, uri, Uri};

use crate::error::ProxyError;
use crate::resolver::{HostResolver, ResolveError};

/// The inbound host, from the URI authority or the `Host` header.
pub fn inbound_host(parts: &Parts) -> Option<String> {
    if let Some(authority) = parts.uri.authority() {
        return Some(authority.to_string());
    }
    parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Build the outbound URI for `parts`, resolving `host` through `resolver`.
///
/// The first resolved address becomes the authority verbatim; addresses
/// beyond index zero are inert, there is no failover. Fails with
/// `ProxyError::Resolution` when resolution errors, comes back empty, or
/// yields an address that cannot form an authority.
pub async fn adapt_uri(
    parts: &Parts,
    host: &str,
    https: bool,
    resolver: &dyn HostResolver,
) -> Result<Uri, ProxyError> {
    let resolution_error = |source: ResolveError| ProxyError::Resolution {
        host: host.to_string(),
        source,
    };

    let addresses = resolver.resolve(host).await.map_err(resolution_error)?;
    let Some(address) = addresses.first() else {
        return Err(resolution_error(ResolveError::Empty));
    };

    let authority: uri::Authority = address
        .parse()
        .map_err(|_| resolution_error(ResolveError::BadAddress(address.clone())))?;
    let scheme = if https {
        uri::Scheme::HTTPS
    } else {
        uri::Scheme::HTTP
    };
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|_| resolution_error(ResolveError::BadAddress(address.clone())))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use super::*;
    use crate::resolver::StaticResolver;

    struct FailingResolver;

    #[async_trait::async_trait]
    impl HostResolver for FailingResolver {
        async fn resolve(&self, _host: &str) -> Result<Vec<String>, ResolveError> {
            Err(ResolveError::Lookup(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "nxdomain",
            )))
        }
    }

    fn parts_for(uri: &str) -> Parts {
        Request::builder()
            .uri(uri)
            .header("host", "example.com")
            .body(Body::empty())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn first_address_becomes_the_authority() {
        let resolver = StaticResolver::new(vec![
            "10.0.0.1:80".to_string(),
            "10.0.0.2:80".to_string(),
        ]);
        let parts = parts_for("/index.html?a=1");

        let uri = adapt_uri(&parts, "example.com", false, &resolver)
            .await
            .unwrap();
        assert_eq!(uri.authority().unwrap().as_str(), "10.0.0.1:80");
        assert_eq!(uri.scheme_str(), Some("http"));
        assert_eq!(uri.path_and_query().unwrap().as_str(), "/index.html?a=1");
    }

    #[tokio::test]
    async fn secure_inbound_means_https_outbound() {
        let resolver = StaticResolver::new(vec!["10.0.0.1:443".to_string()]);
        let parts = parts_for("/");

        let uri = adapt_uri(&parts, "example.com", true, &resolver)
            .await
            .unwrap();
        assert_eq!(uri.scheme_str(), Some("https"));

        let uri = adapt_uri(&parts, "example.com", false, &resolver)
            .await
            .unwrap();
        assert_eq!(uri.scheme_str(), Some("http"));
    }

    #[tokio::test]
    async fn resolver_failure_is_a_resolution_error() {
        let parts = parts_for("/");
        let err = adapt_uri(&parts, "bad.example", false, &FailingResolver)
            .await
            .unwrap_err();
        match err {
            ProxyError::Resolution { host, .. } => assert_eq!(host, "bad.example"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_resolution_is_a_resolution_error() {
        let resolver = StaticResolver::new(Vec::new());
        let parts = parts_for("/");
        assert!(matches!(
            adapt_uri(&parts, "example.com", false, &resolver).await,
            Err(ProxyError::Resolution { .. })
        ));
    }

    #[test]
    fn inbound_host_prefers_uri_authority() {
        let parts = Request::builder()
            .uri("http://authority.example:8080/path")
            .header("host", "header.example")
            .body(Body::empty())
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(
            inbound_host(&parts).as_deref(),
            Some("authority.example:8080")
        );

        let parts = parts_for("/path");
        assert_eq!(inbound_host(&parts).as_deref(), Some("example.com"));
    }
}
