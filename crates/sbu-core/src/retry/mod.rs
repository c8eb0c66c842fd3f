//! Whole-item retry and backoff policy.
//!
//! This module encapsulates error classification (quota, permissions,
//! malformed payloads, transient server faults) and backoff decisions so the
//! batch orchestrator and upload session share one consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_api};
pub use error::{AttemptError, UploadError};
pub use policy::{ErrorKind, RetryAction, RetryPolicy};
pub use run::run_with_retry;
