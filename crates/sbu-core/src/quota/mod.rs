//! Daily API quota ledger.
//!
//! Tracks units spent against the remote service's rolling daily budget and
//! persists the tally across process runs so repeated scheduler invocations
//! share one budget. Admission is a pure query (`can_consume`); `consume`
//! is the only mutation and persists synchronously.
//!
//! No cross-process locking: two concurrent processes can both pass
//! `can_consume` and jointly overspend. Single-process operation is assumed.

mod persist;

pub use persist::PersistedQuota;

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::clock::Clock;

/// Quota cost of one `video.insert` call.
pub const UPLOAD_COST: u64 = 1_600;

/// Default daily budget in units.
pub const DEFAULT_DAILY_LIMIT: u64 = 10_000;

/// Local wall-clock hour of the daily reset (midnight US-Pacific expressed
/// in the fixed +9h wall clock this tool runs under).
pub const DEFAULT_RESET_HOUR: u32 = 17;

/// In-memory ledger bound to one state file and one clock.
pub struct QuotaLedger<C: Clock> {
    used: u64,
    limit: u64,
    reset_at: NaiveDateTime,
    path: PathBuf,
    reset_hour: u32,
    clock: C,
}

/// Next occurrence of the daily reset boundary at `reset_hour` local time.
/// If today's boundary is not strictly in the future, it moves to tomorrow.
pub fn next_reset_boundary(now: NaiveDateTime, reset_hour: u32) -> NaiveDateTime {
    let mut boundary = now
        .date()
        .and_hms_opt(reset_hour, 0, 0)
        .unwrap_or_else(|| now.date().and_hms_opt(0, 0, 0).expect("midnight exists"));
    if now >= boundary {
        boundary += ChronoDuration::days(1);
    }
    boundary
}

impl<C: Clock> QuotaLedger<C> {
    /// Load the ledger from `path`. A missing, corrupt, or expired state file
    /// yields a fresh ledger (used = 0, boundary recomputed) which is
    /// persisted immediately.
    pub fn load(path: &Path, limit: u64, reset_hour: u32, clock: C) -> Self {
        let now = clock.now();
        let mut ledger = Self {
            used: 0,
            limit,
            reset_at: next_reset_boundary(now, reset_hour),
            path: path.to_path_buf(),
            reset_hour,
            clock,
        };

        match persist::read_state(path) {
            Ok(Some(state)) => match state.reset_time {
                Some(reset_at) if now < reset_at => {
                    ledger.used = state.current_usage;
                    ledger.reset_at = reset_at;
                    return ledger;
                }
                Some(_) => {
                    tracing::info!("quota reset boundary passed, starting a fresh day");
                }
                None => {
                    tracing::warn!("quota state has no reset time, reinitializing");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("could not read quota state, reinitializing: {:#}", e);
            }
        }

        ledger.save();
        ledger
    }

    /// True iff spending `cost` units would stay within the daily budget.
    pub fn can_consume(&self, cost: u64) -> bool {
        self.used + cost <= self.limit
    }

    /// Spend `cost` units if the budget allows. Persists the new tally;
    /// a persistence failure is logged, not rolled back.
    pub fn consume(&mut self, cost: u64) -> bool {
        if !self.can_consume(cost) {
            return false;
        }
        self.used += cost;
        self.save();
        true
    }

    /// Zero the tally and recompute the next reset boundary.
    pub fn reset(&mut self) {
        self.used = 0;
        self.reset_at = next_reset_boundary(self.clock.now(), self.reset_hour);
        self.save();
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn reset_at(&self) -> NaiveDateTime {
        self.reset_at
    }

    pub fn remaining_units(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Whole uploads still affordable today.
    pub fn remaining_uploads(&self) -> u64 {
        self.remaining_units() / UPLOAD_COST
    }

    /// Human-readable snapshot. Pure projection, no mutation.
    pub fn status(&self) -> QuotaStatus {
        let now = self.clock.now();
        let until_reset = (self.reset_at - now).max(ChronoDuration::zero());
        QuotaStatus {
            used: self.used,
            limit: self.limit,
            remaining_units: self.remaining_units(),
            remaining_uploads: self.remaining_uploads(),
            reset_at: self.reset_at,
            until_reset,
        }
    }

    fn save(&self) {
        let state = PersistedQuota {
            current_usage: self.used,
            reset_time: Some(self.reset_at),
            daily_limit: self.limit,
            last_updated: self.clock.now(),
        };
        if let Err(e) = persist::write_state(&self.path, &state) {
            tracing::warn!("could not save quota state: {:#}", e);
        }
    }
}

/// Snapshot of the ledger for display.
#[derive(Debug, Clone)]
pub struct QuotaStatus {
    pub used: u64,
    pub limit: u64,
    pub remaining_units: u64,
    pub remaining_uploads: u64,
    pub reset_at: NaiveDateTime,
    pub until_reset: ChronoDuration,
}

impl fmt::Display for QuotaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percent = if self.limit > 0 {
            (self.used as f64 / self.limit as f64) * 100.0
        } else {
            0.0
        };
        let hours = self.until_reset.num_hours();
        let minutes = self.until_reset.num_minutes() % 60;

        writeln!(f, "usage:             {} / {} units", self.used, self.limit)?;
        writeln!(f, "remaining:         {} units", self.remaining_units)?;
        writeln!(f, "remaining uploads: {}", self.remaining_uploads)?;
        writeln!(f, "resets in:         {}h{:02}m", hours, minutes)?;
        writeln!(
            f,
            "reset at:          {}",
            self.reset_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        write!(f, "used:              {:.1}%  [{}]", percent, usage_bar(self.used, self.limit))
    }
}

fn usage_bar(used: u64, limit: u64) -> String {
    const WIDTH: usize = 40;
    let filled = if limit > 0 {
        ((used as f64 / limit as f64) * WIDTH as f64) as usize
    } else {
        0
    }
    .min(WIDTH);
    let mut bar = String::with_capacity(WIDTH);
    bar.extend(std::iter::repeat('#').take(filled));
    bar.extend(std::iter::repeat('-').take(WIDTH - filled));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn fresh_ledger(dir: &tempfile::TempDir, now: NaiveDateTime) -> QuotaLedger<FixedClock> {
        let path = dir.path().join("quota_state.json");
        QuotaLedger::load(&path, DEFAULT_DAILY_LIMIT, DEFAULT_RESET_HOUR, FixedClock::at(now))
    }

    #[test]
    fn boundary_today_when_before_reset_hour() {
        let boundary = next_reset_boundary(at(2025, 11, 20, 10, 0), 17);
        assert_eq!(boundary, at(2025, 11, 20, 17, 0));
    }

    #[test]
    fn boundary_tomorrow_when_at_or_after_reset_hour() {
        assert_eq!(
            next_reset_boundary(at(2025, 11, 20, 17, 0), 17),
            at(2025, 11, 21, 17, 0)
        );
        assert_eq!(
            next_reset_boundary(at(2025, 11, 20, 23, 30), 17),
            at(2025, 11, 21, 17, 0)
        );
    }

    #[test]
    fn consume_succeeds_iff_can_consume() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = fresh_ledger(&dir, at(2025, 11, 20, 10, 0));

        // 6 uploads of 1600 fit in 10_000, the 7th does not.
        for _ in 0..6 {
            assert!(ledger.can_consume(UPLOAD_COST));
            assert!(ledger.consume(UPLOAD_COST));
        }
        assert!(!ledger.can_consume(UPLOAD_COST));
        assert!(!ledger.consume(UPLOAD_COST));
        assert_eq!(ledger.used(), 9_600);
        assert!(ledger.used() <= ledger.limit());
    }

    #[test]
    fn denied_consume_does_not_mutate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota_state.json");
        let mut ledger = QuotaLedger::load(&path, 1_599, 17, FixedClock::at(at(2025, 1, 1, 0, 0)));
        assert!(!ledger.consume(UPLOAD_COST));
        assert_eq!(ledger.used(), 0);
    }

    #[test]
    fn remaining_uploads_floors() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = fresh_ledger(&dir, at(2025, 11, 20, 10, 0));
        assert_eq!(ledger.remaining_uploads(), 6);
        ledger.consume(UPLOAD_COST);
        assert_eq!(ledger.remaining_units(), 8_400);
        assert_eq!(ledger.remaining_uploads(), 5);
    }

    #[test]
    fn state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota_state.json");
        let now = at(2025, 11, 20, 10, 0);

        let mut ledger = QuotaLedger::load(&path, DEFAULT_DAILY_LIMIT, 17, FixedClock::at(now));
        assert!(ledger.consume(UPLOAD_COST));
        let reset_at = ledger.reset_at();

        let reloaded = QuotaLedger::load(&path, DEFAULT_DAILY_LIMIT, 17, FixedClock::at(now));
        assert_eq!(reloaded.used(), UPLOAD_COST);
        assert_eq!(reloaded.reset_at(), reset_at);
    }

    #[test]
    fn reload_past_boundary_resets_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota_state.json");

        let mut ledger =
            QuotaLedger::load(&path, DEFAULT_DAILY_LIMIT, 17, FixedClock::at(at(2025, 11, 20, 10, 0)));
        ledger.consume(UPLOAD_COST);
        let old_boundary = ledger.reset_at();

        // Next day, after the boundary passed.
        let later = at(2025, 11, 20, 18, 0);
        let reloaded = QuotaLedger::load(&path, DEFAULT_DAILY_LIMIT, 17, FixedClock::at(later));
        assert_eq!(reloaded.used(), 0);
        assert!(reloaded.reset_at() > old_boundary);
        assert_eq!(reloaded.reset_at(), at(2025, 11, 21, 17, 0));
    }

    #[test]
    fn corrupt_state_file_reinitializes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota_state.json");
        std::fs::write(&path, "not json{{{").unwrap();

        let ledger = QuotaLedger::load(&path, DEFAULT_DAILY_LIMIT, 17, FixedClock::at(at(2025, 11, 20, 10, 0)));
        assert_eq!(ledger.used(), 0);
        // The rewrite repaired the file.
        let reloaded =
            QuotaLedger::load(&path, DEFAULT_DAILY_LIMIT, 17, FixedClock::at(at(2025, 11, 20, 10, 0)));
        assert_eq!(reloaded.used(), 0);
    }

    #[test]
    fn status_is_pure_projection() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = fresh_ledger(&dir, at(2025, 11, 20, 10, 0));
        ledger.consume(UPLOAD_COST);

        let status = ledger.status();
        assert_eq!(status.used, UPLOAD_COST);
        assert_eq!(status.remaining_units, 8_400);
        assert_eq!(status.remaining_uploads, 5);
        assert_eq!(status.until_reset, ChronoDuration::hours(7));
        assert_eq!(ledger.used(), UPLOAD_COST);

        let text = status.to_string();
        assert!(text.contains("1600 / 10000"));
        assert!(text.contains("7h00m"));
    }
}
