//! Batch orchestrator: one run over a bounded slice of the upload queue.
//!
//! Takes the first N rows, and for each in order: checks the media file
//! exists locally, asks the quota ledger for admission, resolves the
//! playlist, runs the upload under the retry policy, and records the
//! outcome. Item failures never abort the batch; only queue I/O does. The
//! queue is rewritten once, after the whole slice, so an interrupt
//! mid-slice leaves the file untouched and the next run repeats the slice.

mod history;
mod summary;

pub use summary::{ItemReport, RunSummary};

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clock::{Clock, Sleeper};
use crate::config::SbuConfig;
use crate::meta::{self, UploadItem};
use crate::queue::{QueueFile, QueueRow, Schema};
use crate::quota::QuotaLedger;
use crate::retry::{run_with_retry, ErrorKind, RetryPolicy, UploadError};
use crate::session::{UploadOutcome, UploadSession};
use crate::service::RemoteService;

pub struct BatchRunner<'a, S: RemoteService, C: Clock, P: Sleeper> {
    service: &'a mut S,
    ledger: &'a mut QuotaLedger<C>,
    sleeper: &'a P,
    policy: RetryPolicy,
    settle: Duration,
    chunk_size: usize,
    source_offset_hours: i32,
    upload_cost: u64,
    history_path: Option<PathBuf>,
}

impl<'a, S: RemoteService, C: Clock, P: Sleeper> BatchRunner<'a, S, C, P> {
    pub fn new(
        service: &'a mut S,
        ledger: &'a mut QuotaLedger<C>,
        sleeper: &'a P,
        cfg: &SbuConfig,
    ) -> Self {
        Self {
            service,
            ledger,
            sleeper,
            policy: RetryPolicy::from_config(&cfg.retry_config()),
            settle: Duration::from_secs(cfg.settle_secs),
            chunk_size: cfg.chunk_size_bytes,
            source_offset_hours: cfg.source_utc_offset_hours,
            upload_cost: cfg.upload_cost,
            history_path: None,
        }
    }

    /// Record per-item outcomes in an append-only CSV (best-effort).
    pub fn with_history(mut self, path: PathBuf) -> Self {
        self.history_path = Some(path);
        self
    }

    /// Drive one run: take up to `max_items` rows, process them in on-disk
    /// order, then commit the remainder. Returns Err only for run-level
    /// queue failures; item failures are counted in the summary.
    pub fn run(&mut self, queue_path: &Path, max_items: usize) -> Result<RunSummary> {
        let queue = QueueFile::load(queue_path)?;
        if queue.is_empty() {
            tracing::info!("queue is empty, all uploads are done");
            return Ok(RunSummary::empty());
        }

        let (slice, remaining) = queue.take(max_items);
        tracing::info!(
            "queue has {} row(s); processing {}, keeping {}",
            queue.len(),
            slice.len(),
            remaining.len()
        );

        let mut reports = Vec::with_capacity(slice.len());
        for (i, row) in slice.iter().enumerate() {
            let file = row.file(queue.schema()).to_string();
            tracing::info!("[{}/{}] {}", i + 1, slice.len(), file);

            let outcome = self.process_row(row, queue.schema());
            let skip_settle = matches!(
                &outcome,
                Err(e) if e.kind == ErrorKind::LocalFileMissing
            );
            match &outcome {
                Ok(o) => tracing::info!("uploaded {}: {}", o.video_id, o.url),
                Err(e) => tracing::error!("upload failed for {}: {}", file, e),
            }
            reports.push(ItemReport { file, outcome });

            // Courtesy pause toward the remote service; skipped when no
            // remote call was made and after the last item.
            if i + 1 < slice.len() && !skip_settle {
                tracing::info!("waiting {}s before the next upload", self.settle.as_secs());
                self.sleeper.sleep(self.settle);
            }
        }

        queue.commit(remaining)?;

        if let Some(path) = &self.history_path {
            if let Err(e) = history::append(path, &reports) {
                tracing::warn!("could not append upload history: {:#}", e);
            }
        }

        let summary = RunSummary::from_reports(reports, remaining.len());
        for line in summary.to_string().lines() {
            tracing::info!("{}", line);
        }
        Ok(summary)
    }

    fn process_row(&mut self, row: &QueueRow, schema: &Schema) -> Result<UploadOutcome, UploadError> {
        let mut item = UploadItem::from_row(row, schema);

        // No admission check and no remote call for a missing local file.
        if !item.media_path.exists() {
            return Err(UploadError::local_file_missing(&item.media_path));
        }

        if !self.ledger.can_consume(self.upload_cost) {
            return Err(UploadError::quota_exhausted(
                self.ledger.remaining_units(),
                self.upload_cost,
            ));
        }

        // Unresolved playlists never block the item.
        if let Some(name) = row.get(schema, "playlist_name") {
            match self.service.find_playlist(name) {
                Ok(Some(id)) => item.playlist_id = Some(id),
                Ok(None) => tracing::warn!(
                    "playlist '{}' not found, uploading without it (add it later in the studio)",
                    name
                ),
                Err(e) => {
                    tracing::warn!("playlist lookup for '{}' failed, uploading without it: {}", name, e)
                }
            }
        }

        let prepared = meta::prepare(&item, self.source_offset_hours);
        let service = &mut *self.service;
        let sleeper = self.sleeper;
        let chunk_size = self.chunk_size;
        let result = run_with_retry(&self.policy, sleeper, || {
            let mut session = UploadSession::new(&mut *service, sleeper, chunk_size);
            session.run(&item, &prepared)
        });

        match result {
            Ok(outcome) => {
                if !self.ledger.consume(self.upload_cost) {
                    tracing::warn!("quota ledger refused consume after a successful upload");
                }
                Ok(outcome)
            }
            Err(mut e) => {
                if e.kind == ErrorKind::InvalidMetadata {
                    e.metadata = serde_json::to_string(&prepared.resource).ok();
                }
                Err(e)
            }
        }
    }
}
