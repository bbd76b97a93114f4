//! Intercepting HTTP forwarding proxy library.
//!
//! Relays client requests to their origin while capturing each response
//! into a pooled buffer, decoding the captured copy, and handing the
//! exchange to a pluggable processing handler. The client always receives
//! the origin's bytes untouched; inspection happens on the side copy.
//!
//! # Architecture Overview
//!
//! ```text
//! client ──▶ http (listener) ──▶ proxy::adapter ──▶ resolver
//!                                      │
//!                                      ▼
//!                               proxy::engine ──▶ upstream origin
//!                                      │
//!                        ┌─────────────┴─────────────┐
//!                        ▼                           ▼
//!                 client response            buffer (pooled capture)
//!                 (verbatim bytes)                   │
//!                                                    ▼
//!                                                 decode
//!                                                    │
//!                                                    ▼
//!                                           handler (exchange)
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod proxy;

// Interception pipeline
pub mod buffer;
pub mod decode;
pub mod handler;
pub mod resolver;

// Cross-cutting concerns
pub mod error;
pub mod observability;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use proxy::ProxyEngine;
