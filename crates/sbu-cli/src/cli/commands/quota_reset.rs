//! `sbu quota-reset` – zero the ledger and start a fresh window now.

use anyhow::Result;

use sbu_core::clock::SystemClock;
use sbu_core::config::SbuConfig;
use sbu_core::quota::QuotaLedger;

use super::quota_state_path;

pub fn run_quota_reset(cfg: &SbuConfig) -> Result<()> {
    let mut ledger = QuotaLedger::load(
        &quota_state_path()?,
        cfg.daily_quota_limit,
        cfg.reset_hour_local,
        SystemClock,
    );
    ledger.reset();
    println!("quota ledger reset");
    println!("{}", ledger.status());
    Ok(())
}
