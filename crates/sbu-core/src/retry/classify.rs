//! Classify HTTP status codes and service reasons into retry error kinds.

use super::error::AttemptError;
use super::policy::ErrorKind;

/// Classify a status code plus the service's machine-readable reason.
pub fn classify_api(status: u32, reason: Option<&str>) -> ErrorKind {
    match (status, reason) {
        (403, Some("quotaExceeded")) => ErrorKind::QuotaExceeded,
        (403, Some("uploadLimitExceeded")) => ErrorKind::UploadLimitExceeded,
        (403, _) => ErrorKind::PermissionDenied,
        (400, Some("invalidVideoMetadata")) => ErrorKind::InvalidMetadata,
        (400, Some("invalidVideo")) => ErrorKind::InvalidMedia,
        (500..=599, _) => ErrorKind::TransientRemote(status as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify an attempt error (API or local I/O) into an ErrorKind.
pub fn classify(err: &AttemptError) -> ErrorKind {
    match err {
        AttemptError::Api(e) => classify_api(e.status, e.reason.as_deref()),
        AttemptError::Io(_) => ErrorKind::Other,
    }
}
