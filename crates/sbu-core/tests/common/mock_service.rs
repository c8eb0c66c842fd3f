//! In-memory remote service for batch-level tests: records every call and
//! plays back a scripted error per initiation when asked to.

use std::collections::{HashMap, VecDeque};

use sbu_core::meta::VideoResource;
use sbu_core::service::{ApiError, ChunkOutcome, RemoteService, UploadedVideo};

pub struct MockService {
    /// Known playlists by name.
    pub playlists: HashMap<String, String>,
    /// Captured initiation bodies, in call order.
    pub started: Vec<serde_json::Value>,
    /// `(playlist_id, video_id)` pairs in call order.
    pub playlist_adds: Vec<(String, String)>,
    /// Errors returned by successive `start_resumable` calls before any
    /// bytes move; empty means every initiation succeeds.
    pub start_errors: VecDeque<ApiError>,
    committed: u64,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            playlists: HashMap::new(),
            started: Vec::new(),
            playlist_adds: Vec::new(),
            start_errors: VecDeque::new(),
            committed: 0,
        }
    }

    pub fn with_playlist(mut self, name: &str, id: &str) -> Self {
        self.playlists.insert(name.to_string(), id.to_string());
        self
    }
}

impl RemoteService for MockService {
    fn start_resumable(&mut self, body: &VideoResource, _media_len: u64) -> Result<String, ApiError> {
        if let Some(err) = self.start_errors.pop_front() {
            return Err(err);
        }
        self.started.push(serde_json::to_value(body).unwrap());
        self.committed = 0;
        Ok(format!("mock://session/{}", self.started.len()))
    }

    fn upload_chunk(
        &mut self,
        _session_uri: &str,
        offset: u64,
        chunk: &[u8],
        total_len: u64,
    ) -> Result<ChunkOutcome, ApiError> {
        self.committed = offset + chunk.len() as u64;
        if self.committed >= total_len {
            Ok(ChunkOutcome::Done(UploadedVideo {
                id: format!("vid{}", self.started.len()),
            }))
        } else {
            Ok(ChunkOutcome::Accepted {
                committed: self.committed,
            })
        }
    }

    fn find_playlist(&mut self, name: &str) -> Result<Option<String>, ApiError> {
        Ok(self.playlists.get(name).cloned())
    }

    fn add_to_playlist(&mut self, playlist_id: &str, video_id: &str) -> Result<(), ApiError> {
        self.playlist_adds
            .push((playlist_id.to_string(), video_id.to_string()));
        Ok(())
    }
}
