//! Cross-cutting observability.
//!
//! Structured logging is initialized in `main` via `tracing-subscriber`;
//! this module owns the metrics side.

pub mod metrics;
