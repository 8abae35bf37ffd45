use std::path::PathBuf;

use thiserror::Error;

/// Every way a pipeline stage or CLI action can fail.
#[derive(Debug, Error)]
pub enum ForesightError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("device unavailable: {path:?}: {source}")]
    DeviceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to grab device {path:?}: {source}")]
    GrabFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid device {path:?}: {reason}")]
    InvalidDevice { path: PathBuf, reason: String },

    #[error("non-fatal I/O condition (EAGAIN) on {path:?}")]
    IoAgain { path: PathBuf },

    #[error("fatal I/O error on {path:?}: {source}")]
    IoFatal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode raw event from {path:?}")]
    DecodeFailure { path: PathBuf },

    #[error("invalid unicode code point: {0:#x}")]
    CodepointInvalid(u32),

    #[error("no compose table available")]
    ComposeUnavailable,

    #[error("failed to install service unit: {0}")]
    ServiceInstallFailed(String),
}

pub type Result<T> = std::result::Result<T, ForesightError>;

/// Number of retries budgeted to a producer/emitter write before an
/// `IoFatal` is surfaced instead of being retried.
pub const IO_RETRY_BUDGET: u32 = 3;
