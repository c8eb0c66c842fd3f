//! Remote video service boundary.
//!
//! The orchestrator and upload session only talk to `RemoteService`; the
//! production implementation (`HttpService`) speaks the resumable upload
//! protocol over curl, and tests substitute a scripted mock.

mod http;

pub use http::HttpService;

use thiserror::Error;

use crate::meta::VideoResource;

/// Error from one remote call: HTTP status plus the service's machine
/// readable reason when the response carried one. Transport-level failures
/// (DNS, connect, timeout) use status 0.
#[derive(Debug, Clone, Error)]
#[error("HTTP {status} ({}): {message}", self.reason.as_deref().unwrap_or("unclassified"))]
pub struct ApiError {
    pub status: u32,
    pub reason: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            reason: None,
            message: message.into(),
        }
    }
}

/// Result of one chunk transfer.
#[derive(Debug, Clone)]
pub enum ChunkOutcome {
    /// Service stored bytes up to `committed` (exclusive); send more.
    Accepted { committed: u64 },
    /// All bytes received; the video resource exists remotely.
    Done(UploadedVideo),
}

#[derive(Debug, Clone)]
pub struct UploadedVideo {
    pub id: String,
}

/// The calls the upload pipeline needs from the remote service. Credential
/// acquisition and client construction happen outside; implementations are
/// handed a ready-to-use access token.
pub trait RemoteService {
    /// Open a resumable upload session for `body`; returns the session URI.
    fn start_resumable(&mut self, body: &VideoResource, media_len: u64) -> Result<String, ApiError>;

    /// Send one chunk at `offset`. `total_len` is the full media size.
    fn upload_chunk(
        &mut self,
        session_uri: &str,
        offset: u64,
        chunk: &[u8],
        total_len: u64,
    ) -> Result<ChunkOutcome, ApiError>;

    /// Resolve a playlist name to its id; `Ok(None)` when no match exists.
    fn find_playlist(&mut self, name: &str) -> Result<Option<String>, ApiError>;

    /// Append an uploaded video to a playlist.
    fn add_to_playlist(&mut self, playlist_id: &str, video_id: &str) -> Result<(), ApiError>;
}
