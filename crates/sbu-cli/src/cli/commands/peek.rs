//! `sbu peek` – list pending queue rows without uploading.

use anyhow::Result;
use std::path::Path;

use sbu_core::queue::QueueFile;

pub fn run_peek(path: &Path) -> Result<()> {
    let queue = QueueFile::load(path)?;
    if queue.is_empty() {
        println!("Queue is empty.");
        return Ok(());
    }

    println!("{:<4} {:<30} {:<9} {:<19} {}", "#", "TITLE", "PRIVACY", "PUBLISH AT", "FILE");
    for (i, row) in queue.rows().iter().enumerate() {
        let schema = queue.schema();
        let title = row.get(schema, "title").unwrap_or("-");
        let privacy = row.get(schema, "privacy_status").unwrap_or("public");
        let publish_at = row.get(schema, "publish_at").unwrap_or("-");
        println!(
            "{:<4} {:<30} {:<9} {:<19} {}",
            i + 1,
            title,
            privacy,
            publish_at,
            row.file(schema)
        );
    }
    println!("{} row(s) pending", queue.len());
    Ok(())
}
