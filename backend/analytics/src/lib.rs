//! Persistent record of routing outcomes for later inspection.

pub mod recorder;
pub mod store;

pub use recorder::spawn_recorder;
pub use store::{AnalyticsStore, ProviderSummary};
