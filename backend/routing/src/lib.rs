//! Task-category routing with availability filtering and sequential fallback.

pub mod availability;
pub mod models;
pub mod policy;
pub mod reporter;
pub mod router;

pub use availability::{AvailabilityRegistry, DEFAULT_PROBE_TIMEOUT};
pub use models::{ModelTable, default_model};
pub use policy::{PolicyError, RoutingPolicy, default_preferences};
pub use reporter::{ChannelReporter, FanoutReporter, MemoryReporter, NoopReporter, TracingReporter};
pub use router::{Router, RouterStats};
