//! Telemetry and structured logging components for RouteForge.
//!
//! Handles subscriber setup (console plus optional rolling NDJSON file) and
//! scrubbing of credentials from upstream error text.

pub mod logger;
pub mod redact;

pub use logger::{LoggerGuard, init_logger};
pub use redact::{mask_secret, redact_sensitive_data};
