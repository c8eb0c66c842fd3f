use std::time::Duration;

use crate::config::RetryConfig;

/// High-level classification of an upload failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Daily API budget exhausted. Abort the item; retrying cannot help today.
    QuotaExceeded,
    /// Missing scope or forbidden operation.
    PermissionDenied,
    /// The channel hit its daily upload cap.
    UploadLimitExceeded,
    /// The service rejected the metadata payload.
    InvalidMetadata,
    /// The service rejected the media file itself.
    InvalidMedia,
    /// Server-side fault (5xx); retryable with exponential backoff.
    TransientRemote(u16),
    /// Media file absent locally; recorded before any remote call.
    LocalFileMissing,
    /// Anything unclassified; retried after a fixed delay.
    Other,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::TransientRemote(_) | ErrorKind::Other)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Do not retry this item.
    Abort,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Whole-item retry policy: bounded attempts, exponential backoff on server
/// faults, fixed delay on unclassified failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Backoff unit for server faults: `unit * 2^attempt`.
    pub backoff_unit: Duration,
    /// Fixed wait before retrying unclassified failures.
    pub flat_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(5),
            flat_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            backoff_unit: Duration::from_secs(cfg.backoff_unit_secs),
            flat_delay: Duration::from_secs(cfg.flat_delay_secs),
        }
    }

    /// Decide what to do after attempt number `attempt` (0-based) failed
    /// with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryAction {
        if !kind.is_retryable() {
            return RetryAction::Abort;
        }
        if attempt + 1 >= self.max_attempts {
            return RetryAction::Abort;
        }
        match kind {
            ErrorKind::TransientRemote(_) => {
                let exp = 1u32 << attempt.min(8);
                RetryAction::RetryAfter(self.backoff_unit.saturating_mul(exp))
            }
            _ => RetryAction::RetryAfter(self.flat_delay),
        }
    }
}
