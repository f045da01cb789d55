//! Download resolution helpers: file selection and passkey rewriting.

mod file_select;
mod passkey;

pub use file_select::{episode_file, largest_file, select_file};
pub use passkey::{is_valid_passkey, substitute_passkey, PasskeyError, PASSKEY_PLACEHOLDER};

use thiserror::Error;

/// Errors from the download-resolution path.
#[derive(Debug, Error, Clone)]
pub enum DownloadError {
    #[error("No download could be resolved")]
    NoDownload,

    #[error("Invalid or missing access credential: {0}")]
    InvalidCredential(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("No debrid provider configured")]
    ProviderUnavailable,

    #[error("Debrid error: {0}")]
    Debrid(String),

    #[error("Metadata fetch error: {0}")]
    Fetch(String),

    #[error("Aggregation failed: {0}")]
    Aggregate(String),
}
