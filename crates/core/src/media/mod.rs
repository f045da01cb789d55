//! Media identification and metadata resolution.

mod cinemeta;
mod types;

pub use cinemeta::CinemetaClient;
pub use types::*;
