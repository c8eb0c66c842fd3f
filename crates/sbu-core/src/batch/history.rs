//! Best-effort upload history: one CSV row per processed item, appended
//! across runs under the state dir.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::queue::codec;

use super::summary::ItemReport;

pub const HISTORY_COLUMNS: &[&str] = &["file", "status", "video_id", "url", "error", "finished_at"];

/// Append one row per report, writing the header first when the file is new.
pub fn append(path: &Path, reports: &[ItemReport]) -> Result<()> {
    if reports.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }

    let is_new = !path.exists();
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open history file: {}", path.display()))?;

    let mut out = String::new();
    if is_new {
        let header: Vec<String> = HISTORY_COLUMNS.iter().map(|c| c.to_string()).collect();
        out.push_str(&codec::write_record(&header));
    }
    let finished_at = chrono::Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S");
    for report in reports {
        let (status, video_id, url, error) = match &report.outcome {
            Ok(o) => ("success", o.video_id.clone(), o.url.clone(), String::new()),
            Err(e) => ("failed", String::new(), String::new(), e.to_string()),
        };
        out.push_str(&codec::write_record(&[
            report.file.clone(),
            status.to_string(),
            video_id,
            url,
            error,
            finished_at.to_string(),
        ]));
    }

    file.write_all(out.as_bytes())
        .with_context(|| format!("append history: {}", path.display()))?;
    Ok(())
}
