//! Indexer registry abstraction, health tracking and the timeout guard.

mod guard;
mod health;
mod jackett;
mod types;

pub use guard::timed_search;
pub use health::{HealthConfig, HealthStats, IndexerHealth};
pub use jackett::JackettRegistry;
pub use types::*;
