//! HTTP listener surface.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, route-all)
//!     → proxy engine (adapt, dispatch, fan-out, hand-off)
//!     → response streamed back to client
//! ```

pub mod server;

pub use server::HttpServer;
