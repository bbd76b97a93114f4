//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → ProxyConfig (immutable)
//!     → consumed once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs

pub mod loader;
pub mod schema;

pub use schema::{ListenerConfig, ObservabilityConfig, ProxyConfig, ResolverConfig, TlsConfig};
