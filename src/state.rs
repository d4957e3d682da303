//! Persisted record of already-archived items.
//!
//! The set lives in one JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "last_scan": "2024-05-01T08:00:00+00:00",
//!   "processed": {
//!     "youtube": [
//!       { "video_id": "abc123", "title": "...", "processed_at": "..." }
//!     ]
//!   }
//! }
//! ```
//!
//! Records are only ever appended. Older files used `id` instead of
//! `video_id`; both are honoured when checking membership.

use crate::error::Result;
use crate::media_source::{MediaItem, SourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const STATE_VERSION: u32 = 1;

/// One archived item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// Legacy spelling of `video_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    /// Timestamp as written; older files may lack a timezone.
    #[serde(default)]
    pub processed_at: String,
}

impl ProcessedRecord {
    /// The item ID under either field name.
    pub fn item_id(&self) -> &str {
        self.video_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_default()
    }

    pub fn matches(&self, id: &str) -> bool {
        self.video_id.as_deref() == Some(id) || self.id.as_deref() == Some(id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_scan: Option<String>,
    #[serde(default)]
    processed: BTreeMap<String, Vec<ProcessedRecord>>,
}

/// The processed set, bound to the file it was loaded from.
#[derive(Debug)]
pub struct ProcessedSet {
    path: PathBuf,
    state: StateFile,
}

impl ProcessedSet {
    /// Load the set from `path`. A missing file is an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No state file at {}, starting empty", path.display());
            return Ok(Self::empty(path));
        }

        let content = std::fs::read_to_string(path)?;
        let mut set = Self::from_json(&content)?;
        set.path = path.to_path_buf();
        Ok(set)
    }

    /// Parse a state document not bound to any file yet.
    pub fn from_json(content: &str) -> Result<Self> {
        let state: StateFile = if content.trim().is_empty() {
            StateFile::default()
        } else {
            serde_json::from_str(content)?
        };
        Ok(Self {
            path: PathBuf::new(),
            state,
        })
    }

    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: StateFile::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an item of this source has already been archived.
    pub fn is_processed(&self, source_type: SourceType, id: &str) -> bool {
        self.records(source_type).iter().any(|r| r.matches(id))
    }

    /// Append a record. Duplicates are not checked here.
    pub fn record(&mut self, source_type: SourceType, item: &MediaItem, when: DateTime<Utc>) {
        self.state
            .processed
            .entry(source_type.as_str().to_string())
            .or_default()
            .push(ProcessedRecord {
                video_id: Some(item.id.clone()),
                id: None,
                title: item.title.clone(),
                processed_at: when.to_rfc3339(),
            });
    }

    /// Remove the newest record for a source, undoing a [`record`](Self::record)
    /// whose save failed.
    pub fn forget_last(&mut self, source_type: SourceType) -> Option<ProcessedRecord> {
        let key = source_type.as_str();
        let records = self.state.processed.get_mut(key)?;
        let removed = records.pop();
        if records.is_empty() {
            self.state.processed.remove(key);
        }
        removed
    }

    /// Records for one source, oldest first.
    pub fn records(&self, source_type: SourceType) -> &[ProcessedRecord] {
        self.state
            .processed
            .get(source_type.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of records across all sources.
    pub fn len(&self) -> usize {
        self.state.processed.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_scan(&self) -> Option<&str> {
        self.state.last_scan.as_deref()
    }

    /// Note the completion of a source scan.
    pub fn mark_scanned(&mut self, when: DateTime<Utc>) {
        self.state.last_scan = Some(when.to_rfc3339());
    }

    /// Write the set back to its file, replacing it atomically.
    pub fn save(&mut self) -> Result<()> {
        self.state.version = STATE_VERSION;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let content = serde_json::to_string_pretty(&self.state)?;
        let mut file = tempfile::NamedTempFile::new_in(&parent)?;
        file.write_all(content.as_bytes())?;
        file.persist(&self.path).map_err(|e| e.error)?;

        info!("Saved {} processed records to {}", self.len(), self.path.display());
        Ok(())
    }
}
