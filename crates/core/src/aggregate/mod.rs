//! Aggregation orchestration and request coalescing.

mod aggregator;
mod coalesce;

pub use aggregator::Aggregator;
pub use coalesce::Coalescer;

use thiserror::Error;

/// Structural failures of an aggregation call. Transient per-indexer and
/// per-torrent failures are recovered inside the pipeline and never show
/// up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("No indexers configured")]
    NoIndexers,

    #[error("No usable search results")]
    NoResults,

    #[error("Indexer registry error: {0}")]
    Registry(String),

    #[error("Metadata resolution failed: {0}")]
    Metadata(String),
}
