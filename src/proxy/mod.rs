//! Proxy core: request adaptation, fan-out streaming, decode, hand-off.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → adapter.rs (resolve host, rewrite scheme/authority/target)
//!     → engine.rs (dispatch upstream, re-emit status and headers)
//!     → tee.rs (stream body to client + capture into a pooled buffer)
//!     → decode (normalize the captured copy)
//!     → snapshot.rs (freeze request/response views)
//!     → handler (external processing, synchronous)
//!     → buffer released
//! ```

pub mod adapter;
pub mod engine;
pub mod snapshot;
pub mod tee;

pub use engine::ProxyEngine;
