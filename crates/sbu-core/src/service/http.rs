//! curl-backed `RemoteService`: resumable uploads plus playlist lookups.
//!
//! Protocol: an initiating POST carries the JSON metadata body and announces
//! the media size; the service answers with a session URI in `Location`.
//! Chunks then go up as sequential PUTs with `Content-Range`; HTTP 308 means
//! "send more" (the `Range` header acknowledges committed bytes) and 200/201
//! closes the session with the video resource in the body.

use curl::easy::{Easy, List};
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::meta::VideoResource;

use super::{ApiError, ChunkOutcome, RemoteService, UploadedVideo};

const UPLOAD_ENDPOINT: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";
const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const MEDIA_MIME: &str = "video/mp4";

pub struct HttpService {
    token: String,
    upload_endpoint: String,
    api_base: String,
}

impl HttpService {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            upload_endpoint: UPLOAD_ENDPOINT.to_string(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Point the service at non-default endpoints (local test servers).
    pub fn with_endpoints(
        token: impl Into<String>,
        upload_endpoint: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            upload_endpoint: upload_endpoint.into(),
            api_base: api_base.into(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Authorization: Bearer {}", self.token)
    }
}

struct Response {
    status: u32,
    headers: Vec<String>,
    body: Vec<u8>,
}

/// Run a prepared request, optionally streaming `send_body` as the upload
/// payload, collecting status, headers, and body.
fn perform(easy: &mut Easy, send_body: Option<&[u8]>) -> Result<Response, curl::Error> {
    easy.connect_timeout(Duration::from_secs(30))?;
    // Safety net: a completely stuck transfer eventually fails.
    easy.timeout(Duration::from_secs(3600))?;

    let headers: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let body: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let headers_cb = Arc::clone(&headers);
        let body_cb = Arc::clone(&body);
        let mut transfer = easy.transfer();
        transfer.header_function(move |line| {
            if let Ok(s) = std::str::from_utf8(line) {
                headers_cb.lock().unwrap().push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(move |data| {
            body_cb.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        })?;
        if let Some(data) = send_body {
            let mut reader = std::io::Cursor::new(data);
            transfer.read_function(move |buf| Ok(reader.read(buf).unwrap_or(0)))?;
        }
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    let headers = Arc::try_unwrap(headers).unwrap().into_inner().unwrap();
    let body = Arc::try_unwrap(body).unwrap().into_inner().unwrap();
    Ok(Response { status, headers, body })
}

fn find_header<'a>(headers: &'a [String], name: &str) -> Option<&'a str> {
    headers.iter().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        if k.trim().eq_ignore_ascii_case(name) {
            Some(v.trim())
        } else {
            None
        }
    })
}

/// Extract the machine-readable reason and message from a service error body
/// (`{"error": {"message": ..., "errors": [{"reason": ...}]}}`).
fn error_from_response(status: u32, body: &[u8]) -> ApiError {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let reason = error
        .and_then(|e| e.get("errors"))
        .and_then(|errs| errs.get(0))
        .and_then(|e0| e0.get("reason"))
        .and_then(|r| r.as_str())
        .map(str::to_string);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    ApiError { status, reason, message }
}

/// Committed byte count from a 308 `Range: bytes=0-N` header (N inclusive).
fn committed_from_range(range: &str) -> Option<u64> {
    let (_, end) = range.trim().strip_prefix("bytes=")?.split_once('-')?;
    end.parse::<u64>().ok().map(|n| n + 1)
}

impl RemoteService for HttpService {
    fn start_resumable(&mut self, body: &VideoResource, media_len: u64) -> Result<String, ApiError> {
        let json = serde_json::to_vec(body)
            .map_err(|e| ApiError::transport(format!("serialize video body: {e}")))?;

        let mut easy = Easy::new();
        easy.url(&self.upload_endpoint)
            .map_err(|e| ApiError::transport(e.to_string()))?;
        easy.post(true).map_err(|e| ApiError::transport(e.to_string()))?;
        easy.post_field_size(json.len() as u64)
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let mut list = List::new();
        for h in [
            self.auth_header().as_str(),
            "Content-Type: application/json; charset=UTF-8",
            &format!("X-Upload-Content-Type: {MEDIA_MIME}"),
            &format!("X-Upload-Content-Length: {media_len}"),
        ] {
            list.append(h).map_err(|e| ApiError::transport(e.to_string()))?;
        }
        easy.http_headers(list)
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let resp = perform(&mut easy, Some(&json)).map_err(|e| ApiError::transport(e.to_string()))?;
        if !(200..300).contains(&resp.status) {
            return Err(error_from_response(resp.status, &resp.body));
        }
        find_header(&resp.headers, "location")
            .map(str::to_string)
            .ok_or_else(|| ApiError::transport("resumable session response had no Location header"))
    }

    fn upload_chunk(
        &mut self,
        session_uri: &str,
        offset: u64,
        chunk: &[u8],
        total_len: u64,
    ) -> Result<ChunkOutcome, ApiError> {
        let mut easy = Easy::new();
        easy.url(session_uri)
            .map_err(|e| ApiError::transport(e.to_string()))?;
        easy.upload(true).map_err(|e| ApiError::transport(e.to_string()))?;
        easy.in_filesize(chunk.len() as u64)
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let last = offset + chunk.len() as u64 - 1;
        let mut list = List::new();
        for h in [
            self.auth_header().as_str(),
            &format!("Content-Range: bytes {offset}-{last}/{total_len}"),
            &format!("Content-Type: {MEDIA_MIME}"),
        ] {
            list.append(h).map_err(|e| ApiError::transport(e.to_string()))?;
        }
        easy.http_headers(list)
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let resp = perform(&mut easy, Some(chunk)).map_err(|e| ApiError::transport(e.to_string()))?;
        match resp.status {
            308 => {
                let committed = find_header(&resp.headers, "range")
                    .and_then(committed_from_range)
                    .unwrap_or(offset + chunk.len() as u64);
                Ok(ChunkOutcome::Accepted { committed })
            }
            200 | 201 => {
                let parsed: serde_json::Value = serde_json::from_slice(&resp.body)
                    .map_err(|e| ApiError::transport(format!("parse upload response: {e}")))?;
                let id = parsed
                    .get("id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| ApiError::transport("upload response had no video id"))?;
                Ok(ChunkOutcome::Done(UploadedVideo { id: id.to_string() }))
            }
            status => Err(error_from_response(status, &resp.body)),
        }
    }

    fn find_playlist(&mut self, name: &str) -> Result<Option<String>, ApiError> {
        let mut page_token: Option<String> = None;
        loop {
            let mut url = format!(
                "{}/playlists?part=snippet&mine=true&maxResults=50",
                self.api_base
            );
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(token);
            }

            let mut easy = Easy::new();
            easy.url(&url).map_err(|e| ApiError::transport(e.to_string()))?;
            let mut list = List::new();
            list.append(&self.auth_header())
                .map_err(|e| ApiError::transport(e.to_string()))?;
            easy.http_headers(list)
                .map_err(|e| ApiError::transport(e.to_string()))?;

            let resp = perform(&mut easy, None).map_err(|e| ApiError::transport(e.to_string()))?;
            if !(200..300).contains(&resp.status) {
                return Err(error_from_response(resp.status, &resp.body));
            }
            let parsed: serde_json::Value = serde_json::from_slice(&resp.body)
                .map_err(|e| ApiError::transport(format!("parse playlist list: {e}")))?;

            if let Some(items) = parsed.get("items").and_then(|v| v.as_array()) {
                for item in items {
                    let title = item
                        .get("snippet")
                        .and_then(|s| s.get("title"))
                        .and_then(|t| t.as_str());
                    if title == Some(name) {
                        if let Some(id) = item.get("id").and_then(|v| v.as_str()) {
                            return Ok(Some(id.to_string()));
                        }
                    }
                }
            }

            match parsed.get("nextPageToken").and_then(|v| v.as_str()) {
                Some(token) => page_token = Some(token.to_string()),
                None => return Ok(None),
            }
        }
    }

    fn add_to_playlist(&mut self, playlist_id: &str, video_id: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": {
                    "kind": "youtube#video",
                    "videoId": video_id,
                }
            }
        });
        let json = body.to_string().into_bytes();

        let url = format!("{}/playlistItems?part=snippet", self.api_base);
        let mut easy = Easy::new();
        easy.url(&url).map_err(|e| ApiError::transport(e.to_string()))?;
        easy.post(true).map_err(|e| ApiError::transport(e.to_string()))?;
        easy.post_field_size(json.len() as u64)
            .map_err(|e| ApiError::transport(e.to_string()))?;
        let mut list = List::new();
        for h in [
            self.auth_header().as_str(),
            "Content-Type: application/json; charset=UTF-8",
        ] {
            list.append(h).map_err(|e| ApiError::transport(e.to_string()))?;
        }
        easy.http_headers(list)
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let resp = perform(&mut easy, Some(&json)).map_err(|e| ApiError::transport(e.to_string()))?;
        if !(200..300).contains(&resp.status) {
            return Err(error_from_response(resp.status, &resp.body));
        }
        Ok(())
    }
}
