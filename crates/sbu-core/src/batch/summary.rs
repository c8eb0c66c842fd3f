//! Per-item reports and the end-of-run summary block.

use std::fmt;

use crate::retry::UploadError;
use crate::session::UploadOutcome;

/// Recorded outcome of one taken queue row.
#[derive(Debug)]
pub struct ItemReport {
    pub file: String,
    pub outcome: Result<UploadOutcome, UploadError>,
}

impl ItemReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Counts for the terminal summary. `failed > 0` maps to a failing exit code.
#[derive(Debug)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub remaining: usize,
    pub reports: Vec<ItemReport>,
}

impl RunSummary {
    pub fn empty() -> Self {
        Self {
            processed: 0,
            succeeded: 0,
            failed: 0,
            remaining: 0,
            reports: Vec::new(),
        }
    }

    pub fn from_reports(reports: Vec<ItemReport>, remaining: usize) -> Self {
        let succeeded = reports.iter().filter(|r| r.succeeded()).count();
        Self {
            processed: reports.len(),
            succeeded,
            failed: reports.len() - succeeded,
            remaining,
            reports,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== run summary ====")?;
        writeln!(f, "processed: {}", self.processed)?;
        writeln!(f, "succeeded: {}", self.succeeded)?;
        writeln!(f, "failed:    {}", self.failed)?;
        write!(f, "remaining: {}", self.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::ErrorKind;

    fn ok_report(file: &str) -> ItemReport {
        ItemReport {
            file: file.into(),
            outcome: Ok(UploadOutcome {
                video_id: "v".into(),
                url: "u".into(),
                studio_url: "s".into(),
                title: "t".into(),
                privacy: crate::meta::Privacy::Public,
            }),
        }
    }

    fn failed_report(file: &str) -> ItemReport {
        ItemReport {
            file: file.into(),
            outcome: Err(UploadError::new(ErrorKind::Other, "boom")),
        }
    }

    #[test]
    fn counts_from_reports() {
        let s = RunSummary::from_reports(
            vec![ok_report("a"), failed_report("b"), ok_report("c")],
            4,
        );
        assert_eq!(s.processed, 3);
        assert_eq!(s.succeeded, 2);
        assert_eq!(s.failed, 1);
        assert_eq!(s.remaining, 4);
    }

    #[test]
    fn summary_block_lists_all_counts() {
        let s = RunSummary::from_reports(vec![ok_report("a")], 2);
        let text = s.to_string();
        assert!(text.contains("processed: 1"));
        assert!(text.contains("succeeded: 1"));
        assert!(text.contains("failed:    0"));
        assert!(text.contains("remaining: 2"));
    }
}
