//! Network helpers for the listener surface.

pub mod tls;
