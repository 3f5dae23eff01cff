//! Path Resolver
//!
//! Turns a catalog record into the absolute path Photos expects:
//! 1. Bookmark blob, decoded structurally (authoritative when present)
//! 2. Volume name + relative path reconstruction
//!
//! Photos stores boot-volume paths without a mount prefix, so a file on the
//! root volume resolves to `/Users/...` and never `/Volumes/Macintosh HD/Users/...`.

use crate::bookmark;
use crate::record::BookmarkRecord;
use crate::volume::{self, VolumeUuidProbe};
use crate::{Error, Result};

pub struct PathResolver<P> {
    probe: P,
}

impl<P: VolumeUuidProbe> PathResolver<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Resolve a record to its canonical absolute path
    pub fn resolve(&self, record: &BookmarkRecord) -> Result<String> {
        match &record.bookmark_blob {
            Some(blob) if !blob.is_empty() => self.resolve_blob(record.primary_key, blob),
            _ => self.reconstruct(record),
        }
    }

    fn resolve_blob(&self, primary_key: i64, blob: &[u8]) -> Result<String> {
        let components = bookmark::decode(blob).map_err(|e| Error::UnresolvableBookmark {
            primary_key,
            reason: e.to_string(),
        })?;
        if components.is_empty() {
            return Err(Error::UnresolvableBookmark {
                primary_key,
                reason: "bookmark has no path components".to_string(),
            });
        }
        Ok(bookmark::canonical_path(&components))
    }

    fn reconstruct(&self, record: &BookmarkRecord) -> Result<String> {
        let unresolvable = |reason: &str| Error::UnresolvableBookmark {
            primary_key: record.primary_key,
            reason: reason.to_string(),
        };
        let volume_name = record
            .volume_name
            .as_deref()
            .ok_or_else(|| unresolvable("no bookmark and no volume"))?;
        let relative_path = record
            .relative_path
            .as_deref()
            .map(|p| p.trim_start_matches('/'))
            .ok_or_else(|| unresolvable("no bookmark and no relative path"))?;

        if self.is_root_volume(volume_name) {
            Ok(format!("/{relative_path}"))
        } else {
            Ok(format!("{}/{relative_path}", volume::mount_path(volume_name)))
        }
    }

    /// A volume is the boot volume when both UUIDs are known and equal
    fn is_root_volume(&self, volume_name: &str) -> bool {
        let mounted = self.probe.volume_uuid(&volume::mount_path(volume_name));
        let root = self.probe.volume_uuid(volume::ROOT_MOUNT);
        matches!((mounted, root), (Some(m), Some(r)) if m == r)
    }
}
