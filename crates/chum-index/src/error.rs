//! Error types for chum-index

use chum_core::MergeError;
use std::path::PathBuf;

/// Retrieval of one repository target failed.
///
/// Never fatal for the run on its own: the failing target is left out and
/// the remaining ones carry on.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("index file {0:?} not found")]
    Missing(PathBuf),

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("repomd.xml of {repo} has no primary data entry")]
    MissingPrimary { repo: String },

    #[error("invalid repository metadata at {url}: {message}")]
    InvalidRepomd { url: String, message: String },

    #[error("invalid repository listing from {url}: {message}")]
    InvalidListing { url: String, message: String },

    #[error("invalid repository name '{0}'")]
    InvalidTarget(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Classifies a reqwest failure for `url`
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// The index document of a target could not be read as a whole
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to decompress index: {0}")]
    Decompress(String),

    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("document has no <{0}> root element")]
    MissingRoot(&'static str),

    #[error("document ended before </{0}>")]
    Truncated(&'static str),
}

/// A record that was read but cannot become a package
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordAnomaly {
    #[error("record without a package name")]
    MissingName,

    #[error("package '{0}' has no version")]
    MissingVersion(String),
}

/// Why a single target produced no package views
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("cancelled")]
    Cancelled,
}

/// Run-level failures
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no repository produced any usable package data ({failed} of {total} targets failed)")]
    NoUsableData { failed: usize, total: usize },

    #[error("aborted after {failed} failed targets (limit {limit})")]
    TooManyFailures { failed: usize, limit: usize },

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
