//! Upload attempt errors for retry classification.

use std::fmt;

use crate::service::ApiError;

use super::policy::ErrorKind;

/// Error from a single end-to-end upload attempt (remote call or local media
/// read). Used so we can classify and decide retries before converting to a
/// terminal `UploadError`.
#[derive(Debug)]
pub enum AttemptError {
    /// The remote service rejected or failed a call.
    Api(ApiError),
    /// Reading the media file failed mid-transfer.
    Io(std::io::Error),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Api(e) => write!(f, "{}", e),
            AttemptError::Io(e) => write!(f, "media read: {}", e),
        }
    }
}

impl std::error::Error for AttemptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Api(e) => Some(e),
            AttemptError::Io(e) => Some(e),
        }
    }
}

/// Terminal failure for one queue item, after classification and any
/// permitted retries.
#[derive(Debug)]
pub struct UploadError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    /// Offending request body, attached for invalid-metadata failures.
    pub metadata: Option<String>,
}

impl UploadError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
            metadata: None,
        }
    }

    pub fn from_attempt(err: &AttemptError, kind: ErrorKind) -> Self {
        Self::new(kind, err.to_string())
    }

    /// Failure recorded before any remote call: the local media file is gone.
    pub fn local_file_missing(path: &std::path::Path) -> Self {
        Self::new(
            ErrorKind::LocalFileMissing,
            format!("media file not found: {}", path.display()),
        )
    }

    /// Failure recorded when admission control denies the upload cost.
    pub fn quota_exhausted(remaining_units: u64, cost: u64) -> Self {
        Self::new(
            ErrorKind::QuotaExceeded,
            format!("daily quota exhausted: {remaining_units} unit(s) left, upload costs {cost}"),
        )
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for UploadError {}
