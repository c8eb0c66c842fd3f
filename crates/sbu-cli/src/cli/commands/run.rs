//! `sbu run` – upload the next batch of queued videos.

use anyhow::{bail, Context, Result};
use std::path::Path;

use sbu_core::batch::BatchRunner;
use sbu_core::clock::{SystemClock, ThreadSleeper};
use sbu_core::config::{self, SbuConfig};
use sbu_core::quota::QuotaLedger;
use sbu_core::service::HttpService;

use super::quota_state_path;

pub fn run_batch(
    cfg: &SbuConfig,
    queue: &Path,
    max_items: Option<usize>,
    settle_secs: Option<u64>,
    token_env: &str,
) -> Result<()> {
    let token = std::env::var(token_env).with_context(|| {
        format!("no access token: set the {token_env} environment variable")
    })?;

    let mut cfg = cfg.clone();
    if let Some(secs) = settle_secs {
        cfg.settle_secs = secs;
    }
    let max_items = max_items.unwrap_or(cfg.max_items);

    let mut ledger = QuotaLedger::load(
        &quota_state_path()?,
        cfg.daily_quota_limit,
        cfg.reset_hour_local,
        SystemClock,
    );
    let mut service = HttpService::new(token);
    let sleeper = ThreadSleeper;

    let history = config::state_dir()?.join("history.csv");
    let summary = BatchRunner::new(&mut service, &mut ledger, &sleeper, &cfg)
        .with_history(history)
        .run(queue, max_items)?;

    println!("{summary}");
    if summary.failed > 0 {
        bail!("{} upload(s) failed this run", summary.failed);
    }
    Ok(())
}
