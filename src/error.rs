//! Request-level error taxonomy.

use thiserror::Error;

use crate::resolver::ResolveError;

/// Errors that terminate a proxied request.
///
/// Both variants surface to the client as a 500-class response carrying the
/// error text. Decode failures are deliberately absent from this enum: they
/// are logged at the decode boundary and never propagate past it, because
/// the client already holds the correct bytes (see `crate::decode`).
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Host resolution failed or yielded no usable address.
    #[error("resolve host {host:?}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: ResolveError,
    },

    /// The upstream call failed at the transport level.
    #[error("upstream dispatch: {0}")]
    Dispatch(#[from] reqwest::Error),
}

/// Result type for request adaptation and dispatch.
pub type ProxyResult<T> = Result<T, ProxyError>;
