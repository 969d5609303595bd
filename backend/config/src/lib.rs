//! `routeforge-config` — runtime configuration for the RouteForge router.
//!
//! Provides:
//! - Typed config schema (provider credentials, endpoints, models, timeouts, server)
//! - Environment loading with empty-as-absent semantics
//! - YAML policy overlay (`policy` and `models` maps)
//! - Validation report and redacted display view

pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::InvalidEnvVarError;
pub use io::{load_overlay, parse_overlay, PolicyOverlay};
pub use redact::redact;
pub use schema::{ProviderSettings, RouteForgeConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};
