//! Drive one item's upload attempts under the retry policy.

use crate::clock::Sleeper;

use super::classify::classify;
use super::error::{AttemptError, UploadError};
use super::policy::{RetryAction, RetryPolicy};

/// Runs `f` (one full upload attempt) until it succeeds or the policy says
/// to stop. On a retryable failure, waits for the backoff duration through
/// the sleeper then tries again. Never panics past this boundary: the result
/// is always a value the orchestrator can record.
pub fn run_with_retry<T, P, F>(policy: &RetryPolicy, sleeper: &P, mut f: F) -> Result<T, UploadError>
where
    P: Sleeper,
    F: FnMut() -> Result<T, AttemptError>,
{
    let mut attempt = 0u32;
    loop {
        match f() {
            Ok(outcome) => return Ok(outcome),
            Err(e) => {
                let kind = classify(&e);
                tracing::warn!(
                    "upload attempt {}/{} failed ({:?}): {}",
                    attempt + 1,
                    policy.max_attempts,
                    kind,
                    e
                );
                match policy.decide(attempt, kind) {
                    RetryAction::Abort => return Err(UploadError::from_attempt(&e, kind)),
                    RetryAction::RetryAfter(d) => {
                        tracing::info!("retrying in {}s", d.as_secs());
                        sleeper.sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
