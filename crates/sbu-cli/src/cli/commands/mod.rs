//! CLI command handlers. Each command is in its own file.

mod peek;
mod quota_reset;
mod run;
mod status;

pub use peek::run_peek;
pub use quota_reset::run_quota_reset;
pub use run::run_batch;
pub use status::run_status;

use anyhow::Result;
use std::path::PathBuf;

use sbu_core::config;

/// Quota ledger state file under the XDG state directory.
pub(crate) fn quota_state_path() -> Result<PathBuf> {
    Ok(config::state_dir()?.join("quota_state.json"))
}
