//! `sbu status` – show quota usage without mutating anything.

use anyhow::Result;

use sbu_core::clock::SystemClock;
use sbu_core::config::SbuConfig;
use sbu_core::quota::QuotaLedger;

use super::quota_state_path;

pub fn run_status(cfg: &SbuConfig) -> Result<()> {
    let ledger = QuotaLedger::load(
        &quota_state_path()?,
        cfg.daily_quota_limit,
        cfg.reset_hour_local,
        SystemClock,
    );
    println!("{}", ledger.status());
    Ok(())
}
