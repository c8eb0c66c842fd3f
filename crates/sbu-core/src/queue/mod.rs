//! Durable upload queue backed by a flat CSV file.
//!
//! The file is an ordered backlog: header row plus one row per pending video.
//! A run takes the first N rows, processes them, and commits the remainder.
//! Commit is two-phase: byte-for-byte backup of the current file first, then
//! an atomic rewrite (temp file + rename). If the backup cannot be written
//! the rewrite never happens, so the worst crash outcome is a stale queue,
//! never a lost one.

pub mod codec;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Required column: local media path.
pub const COL_FILE: &str = "file";

/// Optional columns recognized by the orchestrator. Anything else in the
/// header is carried through rewrites untouched.
pub const KNOWN_COLUMNS: &[&str] = &[
    COL_FILE,
    "title",
    "description",
    "tags",
    "category_id",
    "privacy_status",
    "playlist_name",
    "publish_at",
];

/// Column layout captured once at load time and reused verbatim on rewrite.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<String>,
    file_idx: usize,
}

impl Schema {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let file_idx = match columns.iter().position(|c| c == COL_FILE) {
            Some(i) => i,
            None => bail!("queue header has no '{}' column", COL_FILE),
        };
        Ok(Self { columns, file_idx })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// One positional record. Values are raw strings exactly as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    fields: Vec<String>,
}

impl QueueRow {
    pub fn from_fields(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Value of the named column; empty cells read as `None`.
    pub fn get<'a>(&'a self, schema: &Schema, name: &str) -> Option<&'a str> {
        let idx = schema.index(name)?;
        match self.fields.get(idx) {
            Some(v) if !v.is_empty() => Some(v.as_str()),
            _ => None,
        }
    }

    /// Local media path (required column).
    pub fn file<'a>(&'a self, schema: &Schema) -> &'a str {
        self.fields
            .get(schema.file_idx)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// The queue file: schema plus the full ordered row sequence.
#[derive(Debug)]
pub struct QueueFile {
    path: PathBuf,
    schema: Schema,
    rows: Vec<QueueRow>,
}

impl QueueFile {
    /// Load the whole queue. A missing file is an error (the scheduler must
    /// distinguish "nothing to do" from "misconfigured path"); an
    /// empty-but-present file yields zero rows.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read queue file: {}", path.display()))?;
        let mut records = codec::parse_records(&text).into_iter();

        let schema = match records.next() {
            Some(header) => Schema::new(header)?,
            None => bail!("queue file is empty (no header row): {}", path.display()),
        };
        for col in schema.columns() {
            if !KNOWN_COLUMNS.contains(&col.as_str()) {
                tracing::debug!("unrecognized queue column '{}', carried through rewrites", col);
            }
        }

        let width = schema.columns().len();
        let rows = records
            .map(|mut fields| {
                // Pad short rows so positional access stays aligned.
                while fields.len() < width {
                    fields.push(String::new());
                }
                QueueRow { fields }
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            rows,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[QueueRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pure split: first `n` rows to process, the rest to keep. No mutation.
    pub fn take(&self, n: usize) -> (&[QueueRow], &[QueueRow]) {
        let n = n.min(self.rows.len());
        self.rows.split_at(n)
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".backup");
        PathBuf::from(name)
    }

    /// Two-phase commit: snapshot the current file to `<path>.backup`, then
    /// atomically rewrite the queue to contain exactly `remaining` under the
    /// original schema. Backup failure aborts before any rewrite.
    pub fn commit(&self, remaining: &[QueueRow]) -> Result<()> {
        let backup = self.backup_path();
        std::fs::copy(&self.path, &backup)
            .with_context(|| format!("create queue backup: {}", backup.display()))?;
        tracing::info!("queue backup written to {}", backup.display());

        let mut out = codec::write_record(self.schema.columns());
        for row in remaining {
            out.push_str(&codec::write_record(&row.fields));
        }

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, &out)
            .with_context(|| format!("write queue temp file: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace queue file: {}", self.path.display()))?;

        tracing::info!(
            "queue rewritten: {} row(s) remaining in {}",
            remaining.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "file,title,description,tags,category_id,privacy_status,playlist_name,publish_at\n\
        a.mp4,First,,tag1,22,public,,\n\
        b.mp4,Second,\"desc, with comma\",\"t1, t2\",22,private,My List,2025-11-20 10:00\n\
        c.mp4,Third,,,,unlisted,,\n";

    fn write_queue(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("upload_list.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = QueueFile::load(&dir.path().join("absent.csv")).unwrap_err();
        assert!(err.to_string().contains("read queue file"));
    }

    #[test]
    fn load_requires_file_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_queue(&dir, "title,description\nx,y\n");
        let err = QueueFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("'file' column"));
    }

    #[test]
    fn header_only_file_is_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_queue(&dir, "file,title\n");
        let q = QueueFile::load(&path).unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn rows_and_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_queue(&dir, SAMPLE);
        let q = QueueFile::load(&path).unwrap();
        assert_eq!(q.len(), 3);

        let s = q.schema();
        let row = &q.rows()[1];
        assert_eq!(row.file(s), "b.mp4");
        assert_eq!(row.get(s, "title"), Some("Second"));
        assert_eq!(row.get(s, "description"), Some("desc, with comma"));
        assert_eq!(row.get(s, "tags"), Some("t1, t2"));
        assert_eq!(row.get(s, "publish_at"), Some("2025-11-20 10:00"));
        // Empty cell reads as None.
        assert_eq!(q.rows()[0].get(s, "playlist_name"), None);
    }

    #[test]
    fn take_is_a_pure_split() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_queue(&dir, SAMPLE);
        let q = QueueFile::load(&path).unwrap();

        let (head, tail) = q.take(2);
        assert_eq!(head.len(), 2);
        assert_eq!(tail.len(), 1);
        assert_eq!(head.len() + tail.len(), q.len());

        // Oversized take is clamped.
        let (head, tail) = q.take(10);
        assert_eq!(head.len(), 3);
        assert!(tail.is_empty());
    }

    #[test]
    fn commit_conserves_rows_and_snapshots_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_queue(&dir, SAMPLE);
        let before = std::fs::read(&path).unwrap();

        let q = QueueFile::load(&path).unwrap();
        let (taken, remaining) = q.take(2);
        assert_eq!(taken.len() + remaining.len(), q.len());
        q.commit(remaining).unwrap();

        // Backup equals the pre-commit file byte-for-byte.
        let backup = std::fs::read(q.backup_path()).unwrap();
        assert_eq!(backup, before);

        let reloaded = QueueFile::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.rows()[0].file(reloaded.schema()), "c.mp4");
        // Quoted content survived the rewrite.
        assert_eq!(
            reloaded.schema().columns()[0..2],
            ["file".to_string(), "title".to_string()]
        );
    }

    #[test]
    fn commit_preserves_unknown_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_queue(
            &dir,
            "file,title,operator_note\na.mp4,First,keep me\nb.mp4,Second,me too\n",
        );
        let q = QueueFile::load(&path).unwrap();
        let (_, remaining) = q.take(1);
        q.commit(remaining).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "file,title,operator_note\nb.mp4,Second,me too\n");
    }

    #[test]
    fn failed_backup_aborts_before_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_queue(&dir, SAMPLE);
        let before = std::fs::read(&path).unwrap();

        let q = QueueFile::load(&path).unwrap();
        // A directory at the backup path makes the copy fail.
        std::fs::create_dir(q.backup_path()).unwrap();

        let (_, remaining) = q.take(2);
        assert!(q.commit(remaining).is_err());
        // Queue file untouched.
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
