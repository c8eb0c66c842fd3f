//! One resumable upload session: chunked transfer of a single media file
//! plus its metadata, with chunk-level retry on transient server faults.
//!
//! State machine: `Idle → InProgress → {Completed | Failed}`, with a
//! `Retrying` sub-state while a chunk is being backed off. Whole-item
//! retries live one layer up in `retry::run_with_retry`.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::time::Duration;

use crate::clock::Sleeper;
use crate::meta::{PreparedUpload, Privacy, UploadItem};
use crate::retry::AttemptError;
use crate::service::{ChunkOutcome, RemoteService};

/// HTTP statuses retried at the chunk level.
pub const TRANSIENT_STATUSES: &[u32] = &[500, 502, 503, 504];

/// Chunk retries per session before the session fails.
pub const MAX_CHUNK_RETRIES: u32 = 5;

/// Linear chunk backoff: `retry_index * this`.
pub const CHUNK_BACKOFF_UNIT: Duration = Duration::from_secs(5);

/// Default chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InProgress,
    /// Waiting out a chunk backoff; logically still in progress.
    Retrying,
    Completed,
    Failed,
}

/// Successful upload: durable remote id plus canonical URLs.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub video_id: String,
    pub url: String,
    pub studio_url: String,
    pub title: String,
    pub privacy: Privacy,
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/shorts/{video_id}")
}

pub fn studio_url(video_id: &str) -> String {
    format!("https://studio.youtube.com/video/{video_id}/edit")
}

pub struct UploadSession<'a, S: RemoteService, P: Sleeper> {
    service: &'a mut S,
    sleeper: &'a P,
    chunk_size: usize,
    state: SessionState,
}

impl<'a, S: RemoteService, P: Sleeper> UploadSession<'a, S, P> {
    pub fn new(service: &'a mut S, sleeper: &'a P, chunk_size: usize) -> Self {
        Self {
            service,
            sleeper,
            chunk_size: chunk_size.max(1),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transfer the item. On success the outcome always carries the remote
    /// id and both URLs; on failure the error is classifiable by the caller.
    pub fn run(
        &mut self,
        item: &UploadItem,
        prepared: &PreparedUpload,
    ) -> Result<UploadOutcome, AttemptError> {
        self.state = SessionState::InProgress;
        let result = self.transfer(item, prepared);
        self.state = match result {
            Ok(_) => SessionState::Completed,
            Err(_) => SessionState::Failed,
        };
        result
    }

    fn transfer(
        &mut self,
        item: &UploadItem,
        prepared: &PreparedUpload,
    ) -> Result<UploadOutcome, AttemptError> {
        let mut file = File::open(&item.media_path).map_err(AttemptError::Io)?;
        let total = file.metadata().map_err(AttemptError::Io)?.len();
        if total == 0 {
            return Err(AttemptError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("media file is empty: {}", item.media_path.display()),
            )));
        }

        let session_uri = self
            .service
            .start_resumable(&prepared.resource, total)
            .map_err(AttemptError::Api)?;
        tracing::info!(
            "uploading {} ({} bytes): {}",
            item.media_path.display(),
            total,
            prepared.title
        );

        let mut buf = vec![0u8; self.chunk_size];
        let mut offset = 0u64;
        // Cumulative across the whole session, not per failure streak.
        let mut retries = 0u32;
        loop {
            // Re-read from the committed offset on every pass, so a retried
            // or partially accepted chunk resends exactly the missing bytes.
            file.seek(SeekFrom::Start(offset)).map_err(AttemptError::Io)?;
            let want = ((total - offset) as usize).min(self.chunk_size);
            let chunk = &mut buf[..want];
            file.read_exact(chunk).map_err(AttemptError::Io)?;

            match self.service.upload_chunk(&session_uri, offset, chunk, total) {
                Ok(ChunkOutcome::Done(video)) => {
                    tracing::info!("upload complete: {}", video.id);
                    let outcome = UploadOutcome {
                        url: watch_url(&video.id),
                        studio_url: studio_url(&video.id),
                        video_id: video.id,
                        title: prepared.title.clone(),
                        privacy: prepared.privacy,
                    };
                    self.add_to_playlist(item, &outcome);
                    return Ok(outcome);
                }
                Ok(ChunkOutcome::Accepted { committed }) => {
                    offset = committed.min(total);
                    let percent = (offset as f64 / total as f64) * 100.0;
                    tracing::debug!("upload progress: {:.0}%", percent);
                }
                Err(e) if TRANSIENT_STATUSES.contains(&e.status) => {
                    retries += 1;
                    if retries > MAX_CHUNK_RETRIES {
                        return Err(AttemptError::Api(e));
                    }
                    let wait = CHUNK_BACKOFF_UNIT * retries;
                    tracing::warn!(
                        "server error ({}) on chunk at {}, retry {}/{} in {}s",
                        e.status,
                        offset,
                        retries,
                        MAX_CHUNK_RETRIES,
                        wait.as_secs()
                    );
                    self.state = SessionState::Retrying;
                    self.sleeper.sleep(wait);
                    self.state = SessionState::InProgress;
                }
                Err(e) => return Err(AttemptError::Api(e)),
            }
        }
    }

    /// Best-effort: a playlist failure never fails the finished upload.
    fn add_to_playlist(&mut self, item: &UploadItem, outcome: &UploadOutcome) {
        let Some(playlist_id) = &item.playlist_id else {
            return;
        };
        match self.service.add_to_playlist(playlist_id, &outcome.video_id) {
            Ok(()) => tracing::info!("added {} to playlist {}", outcome.video_id, playlist_id),
            Err(e) => tracing::warn!(
                "could not add {} to playlist {} (upload unaffected): {}",
                outcome.video_id,
                playlist_id,
                e
            ),
        }
    }
}
