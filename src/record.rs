//! Catalog record types
//!
//! Value types for the rows relink reads from and writes to a Photos catalog.

use serde::Serialize;

/// One file reference from the bookmark table, with its volume context.
///
/// A present `bookmark_blob` is the authoritative location; `volume_name` and
/// `relative_path` are the fallback when it is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkRecord {
    pub primary_key: i64,
    /// Name of the linked volume, `None` when the resource has no volume
    pub volume_name: Option<String>,
    /// UUID string stored for the linked volume (may be stale)
    pub volume_uuid: Option<String>,
    /// Path relative to the volume root
    pub relative_path: Option<String>,
    pub bookmark_blob: Option<Vec<u8>>,
}

impl BookmarkRecord {
    pub fn has_blob(&self) -> bool {
        self.bookmark_blob.as_ref().is_some_and(|blob| !blob.is_empty())
    }

    /// Best human-readable label for log lines when resolution fails
    pub fn label(&self) -> String {
        match (&self.volume_name, &self.relative_path) {
            (Some(volume), Some(path)) => format!("{volume}:{path}"),
            (None, Some(path)) => path.clone(),
            _ => format!("record {}", self.primary_key),
        }
    }
}

/// A storage volume known to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeRecord {
    pub primary_key: i64,
    pub name: String,
    /// Catalog-internal UUID
    pub assigned_uuid: Option<String>,
    /// UUID reported by the OS when the row was written
    pub volume_uuid_string: Option<String>,
}

/// A catalog resource's links to its bookmark and volume rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLink {
    pub primary_key: i64,
    pub bookmark: Option<i64>,
    pub volume: Option<i64>,
}

/// A primary-catalog record whose location resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairTarget {
    pub primary_key: i64,
    pub path: String,
}
