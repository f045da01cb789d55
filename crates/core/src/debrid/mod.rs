//! Debrid provider abstraction and cache reconciliation.

mod reconcile;
mod types;

pub use reconcile::reconcile;
pub use types::{create_provider, CacheValidity, DebridError, DebridProvider};
