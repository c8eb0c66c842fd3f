//! Video metadata: queue-row parsing, Shorts normalization, and the JSON
//! request body sent to the remote service.

pub mod timeconv;

use serde::Serialize;
use std::path::PathBuf;

use crate::queue::{QueueRow, Schema};

/// Marker token that makes an upload discoverable as short-form content.
pub const SHORTS_MARKER: &str = "#Shorts";

/// Default category: People & Blogs.
pub const DEFAULT_CATEGORY_ID: &str = "22";

/// Known category ids, for operator reference.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("1", "Film & Animation"),
    ("2", "Autos & Vehicles"),
    ("10", "Music"),
    ("15", "Pets & Animals"),
    ("17", "Sports"),
    ("19", "Travel & Events"),
    ("20", "Gaming"),
    ("22", "People & Blogs"),
    ("23", "Comedy"),
    ("24", "Entertainment"),
    ("25", "News & Politics"),
    ("26", "Howto & Style"),
    ("27", "Education"),
    ("28", "Science & Technology"),
    ("29", "Nonprofits & Activism"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privacy {
    Public,
    Private,
    Unlisted,
}

impl Privacy {
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Privacy::Public),
            "private" => Some(Privacy::Private),
            "unlisted" => Some(Privacy::Unlisted),
            _ => None,
        }
    }
}

/// One video to upload, built from a queue row. Immutable for the duration
/// of an attempt.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub media_path: PathBuf,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub privacy: Privacy,
    /// Raw local publish time from the row (`YYYY-MM-DD HH:MM[:SS]`).
    pub publish_at: Option<String>,
    /// Resolved collection id, filled in by the orchestrator.
    pub playlist_id: Option<String>,
}

impl UploadItem {
    /// Build an item from a queue row. Unknown privacy strings degrade to
    /// `public` and unknown category ids to the default, each with a
    /// warning; playlist resolution is left to the caller.
    pub fn from_row(row: &QueueRow, schema: &Schema) -> Self {
        let tags = row
            .get(schema, "tags")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let privacy = match row.get(schema, "privacy_status") {
            Some(raw) => Privacy::parse(raw).unwrap_or_else(|| {
                tracing::warn!("unknown privacy_status '{}', using public", raw);
                Privacy::Public
            }),
            None => Privacy::Public,
        };

        let category_id = match row.get(schema, "category_id") {
            Some(raw) if CATEGORIES.iter().any(|(id, _)| *id == raw) => raw.to_string(),
            Some(raw) => {
                tracing::warn!("unknown category_id '{}', using {}", raw, DEFAULT_CATEGORY_ID);
                DEFAULT_CATEGORY_ID.to_string()
            }
            None => DEFAULT_CATEGORY_ID.to_string(),
        };

        Self {
            media_path: PathBuf::from(row.file(schema)),
            title: row.get(schema, "title").unwrap_or("").to_string(),
            description: row.get(schema, "description").unwrap_or("").to_string(),
            tags,
            category_id,
            privacy,
            publish_at: row.get(schema, "publish_at").map(str::to_string),
            playlist_id: None,
        }
    }
}

/// Request body for `videos.insert` (snippet + status parts).
#[derive(Debug, Clone, Serialize)]
pub struct VideoResource {
    pub snippet: Snippet,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatus {
    pub privacy_status: String,
    pub self_declared_made_for_kids: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<String>,
}

/// Normalized metadata ready for transfer: wire body plus the display title
/// and the privacy the operator asked for (the body may differ).
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub resource: VideoResource,
    pub title: String,
    pub privacy: Privacy,
}

/// Normalize an item into its wire body:
/// - append the Shorts marker to title and description if absent;
/// - convert a supplied publish time from the fixed source offset to UTC,
///   dropping scheduling (with a warning) when it does not parse;
/// - force `public` to `private` in the body while a future publish time is
///   set, as the remote service requires.
pub fn prepare(item: &UploadItem, source_offset_hours: i32) -> PreparedUpload {
    let title = mark_title(&item.title);
    let description = mark_description(&item.description);

    let mut privacy_status = item.privacy.as_str().to_string();
    let mut publish_at = None;
    if let Some(raw) = &item.publish_at {
        match timeconv::to_utc_rfc3339(raw, source_offset_hours) {
            Some(utc) => {
                tracing::info!("scheduled publish: {} (local) -> {} (UTC)", raw.trim(), utc);
                if item.privacy == Privacy::Public {
                    privacy_status = Privacy::Private.as_str().to_string();
                }
                publish_at = Some(utc);
            }
            None => {
                tracing::warn!(
                    "publish_at '{}' is not 'YYYY-MM-DD HH:MM[:SS]', uploading unscheduled",
                    raw
                );
            }
        }
    }

    PreparedUpload {
        resource: VideoResource {
            snippet: Snippet {
                title: title.clone(),
                description,
                tags: item.tags.clone(),
                category_id: item.category_id.clone(),
            },
            status: UploadStatus {
                privacy_status,
                self_declared_made_for_kids: false,
                publish_at,
            },
        },
        title,
        privacy: item.privacy,
    }
}

fn has_marker(text: &str) -> bool {
    text.contains("#Shorts") || text.contains("#shorts")
}

fn mark_title(title: &str) -> String {
    if has_marker(title) {
        title.to_string()
    } else {
        format!("{title} {SHORTS_MARKER}")
    }
}

fn mark_description(description: &str) -> String {
    if has_marker(description) {
        description.to_string()
    } else {
        format!("{description}\n\n{SHORTS_MARKER}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{QueueRow, Schema};

    fn schema() -> Schema {
        Schema::new(
            [
                "file",
                "title",
                "description",
                "tags",
                "category_id",
                "privacy_status",
                "playlist_name",
                "publish_at",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap()
    }

    fn row(fields: &[&str]) -> QueueRow {
        QueueRow::from_fields(fields.iter().map(|s| s.to_string()).collect())
    }

    fn item(fields: &[&str]) -> UploadItem {
        UploadItem::from_row(&row(fields), &schema())
    }

    #[test]
    fn from_row_parses_fields() {
        let it = item(&[
            "clips/a.mp4",
            "My clip",
            "A day out",
            "cats, dogs , ,birds",
            "24",
            "unlisted",
            "Pets",
            "2025-11-20 10:00",
        ]);
        assert_eq!(it.media_path, PathBuf::from("clips/a.mp4"));
        assert_eq!(it.tags, vec!["cats", "dogs", "birds"]);
        assert_eq!(it.category_id, "24");
        assert_eq!(it.privacy, Privacy::Unlisted);
        assert_eq!(it.publish_at.as_deref(), Some("2025-11-20 10:00"));
        assert!(it.playlist_id.is_none());
    }

    #[test]
    fn from_row_defaults() {
        let it = item(&["a.mp4", "", "", "", "", "", "", ""]);
        assert_eq!(it.category_id, DEFAULT_CATEGORY_ID);
        assert_eq!(it.privacy, Privacy::Public);
        assert!(it.tags.is_empty());
        assert!(it.publish_at.is_none());
    }

    #[test]
    fn unknown_category_degrades_to_default() {
        let it = item(&["a.mp4", "", "", "", "999", "", "", ""]);
        assert_eq!(it.category_id, DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn unknown_privacy_degrades_to_public() {
        let it = item(&["a.mp4", "", "", "", "", "sekrit", "", ""]);
        assert_eq!(it.privacy, Privacy::Public);
    }

    #[test]
    fn marker_appended_once() {
        assert_eq!(mark_title("My clip"), "My clip #Shorts");
        assert_eq!(mark_title("My clip #Shorts"), "My clip #Shorts");
        assert_eq!(mark_title("all #shorts here"), "all #shorts here");
        assert_eq!(mark_description("desc"), "desc\n\n#Shorts");
        assert_eq!(mark_description("#shorts desc"), "#shorts desc");
    }

    #[test]
    fn prepare_schedules_and_coerces_public_to_private() {
        let mut it = item(&["a.mp4", "T", "D", "", "", "public", "", "2025-11-20 10:00:00"]);
        it.playlist_id = Some("PL1".to_string());
        let prep = prepare(&it, 9);

        assert_eq!(prep.resource.status.publish_at.as_deref(), Some("2025-11-20T01:00:00Z"));
        assert_eq!(prep.resource.status.privacy_status, "private");
        // The operator-facing privacy stays what was asked for.
        assert_eq!(prep.privacy, Privacy::Public);
        assert_eq!(prep.title, "T #Shorts");
    }

    #[test]
    fn prepare_keeps_nonpublic_privacy_when_scheduled() {
        let it = item(&["a.mp4", "T", "D", "", "", "unlisted", "", "2025-11-20 10:00"]);
        let prep = prepare(&it, 9);
        assert_eq!(prep.resource.status.privacy_status, "unlisted");
        assert!(prep.resource.status.publish_at.is_some());
    }

    #[test]
    fn prepare_drops_unparseable_schedule() {
        let it = item(&["a.mp4", "T", "D", "", "", "public", "", "tomorrow-ish"]);
        let prep = prepare(&it, 9);
        assert!(prep.resource.status.publish_at.is_none());
        assert_eq!(prep.resource.status.privacy_status, "public");
    }

    #[test]
    fn wire_body_uses_camel_case() {
        let it = item(&["a.mp4", "T", "D", "x,y", "22", "private", "", ""]);
        let prep = prepare(&it, 9);
        let json = serde_json::to_string(&prep.resource).unwrap();
        assert!(json.contains("\"categoryId\":\"22\""));
        assert!(json.contains("\"privacyStatus\":\"private\""));
        assert!(json.contains("\"selfDeclaredMadeForKids\":false"));
        assert!(!json.contains("publishAt"));
    }
}
