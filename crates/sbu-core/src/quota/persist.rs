//! Persist the quota tally to disk (JSON under the XDG state dir) so the
//! daily budget survives across scheduler invocations.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk quota record. `reset_time` and `last_updated` are ISO-8601 local
/// wall-clock timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedQuota {
    pub current_usage: u64,
    pub reset_time: Option<NaiveDateTime>,
    pub daily_limit: u64,
    pub last_updated: NaiveDateTime,
}

/// Read the state file. Missing file is `Ok(None)`; unreadable or unparsable
/// content is an error (caller falls back to a fresh ledger).
pub fn read_state(path: &Path) -> Result<Option<PersistedQuota>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("read quota state: {}", path.display()))
        }
    };
    let state: PersistedQuota = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse quota state: {}", path.display()))?;
    Ok(Some(state))
}

/// Write the state file (creates the parent dir if needed).
pub fn write_state(path: &Path, state: &PersistedQuota) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state).context("serialize quota state")?;
    std::fs::write(path, json)
        .with_context(|| format!("write quota state: {}", path.display()))?;
    Ok(())
}
