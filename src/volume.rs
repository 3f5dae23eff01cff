//! Volume identity probing
//!
//! The OS-level UUID of a mounted volume decides whether a reconstructed path
//! sits on the boot volume and whether a catalog volume row is stale.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::process::Command;

/// Mount point of the boot volume
pub const ROOT_MOUNT: &str = "/";

/// Mount point for a named volume
pub fn mount_path(volume_name: &str) -> String {
    format!("/Volumes/{volume_name}")
}

/// Looks up the OS-reported UUID of the volume mounted at a path.
///
/// Returns `None` when nothing is mounted there or the lookup fails; absence
/// is not an error.
pub trait VolumeUuidProbe {
    fn volume_uuid(&self, mount_path: &str) -> Option<String>;
}

impl<P: VolumeUuidProbe + ?Sized> VolumeUuidProbe for &P {
    fn volume_uuid(&self, mount_path: &str) -> Option<String> {
        (**self).volume_uuid(mount_path)
    }
}

/// Probe backed by `diskutil info -plist`
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskutilProbe;

impl VolumeUuidProbe for DiskutilProbe {
    fn volume_uuid(&self, mount_path: &str) -> Option<String> {
        let output = match Command::new("diskutil")
            .args(["info", "-plist", mount_path])
            .output()
        {
            Ok(out) if out.status.success() => out.stdout,
            Ok(out) => {
                tracing::debug!("diskutil found no volume at {} ({})", mount_path, out.status);
                return None;
            }
            Err(e) => {
                tracing::debug!("Failed to run diskutil for {}: {}", mount_path, e);
                return None;
            }
        };
        parse_volume_uuid(&output)
    }
}

/// Extract `VolumeUUID` from `diskutil info -plist` output
pub fn parse_volume_uuid(plist_bytes: &[u8]) -> Option<String> {
    let value: plist::Value = plist::from_reader(Cursor::new(plist_bytes)).ok()?;
    value
        .as_dictionary()?
        .get("VolumeUUID")?
        .as_string()
        .map(str::to_string)
}

/// Memoizes another probe for the lifetime of a run
pub struct CachedProbe<P> {
    inner: P,
    cache: RefCell<HashMap<String, Option<String>>>,
}

impl<P: VolumeUuidProbe> CachedProbe<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl<P: VolumeUuidProbe> VolumeUuidProbe for CachedProbe<P> {
    fn volume_uuid(&self, mount_path: &str) -> Option<String> {
        if let Some(hit) = self.cache.borrow().get(mount_path) {
            return hit.clone();
        }
        let uuid = self.inner.volume_uuid(mount_path);
        self.cache
            .borrow_mut()
            .insert(mount_path.to_string(), uuid.clone());
        uuid
    }
}

/// In-memory probe for tests
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FixedProbe {
    uuids: HashMap<String, String>,
    pub(crate) calls: std::cell::Cell<usize>,
}

#[cfg(test)]
impl FixedProbe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn root(self, uuid: &str) -> Self {
        self.mount(ROOT_MOUNT, uuid)
    }

    pub(crate) fn volume(self, name: &str, uuid: &str) -> Self {
        self.mount(&mount_path(name), uuid)
    }

    pub(crate) fn mount(mut self, path: &str, uuid: &str) -> Self {
        self.uuids.insert(path.to_string(), uuid.to_string());
        self
    }
}

#[cfg(test)]
impl VolumeUuidProbe for FixedProbe {
    fn volume_uuid(&self, mount_path: &str) -> Option<String> {
        self.calls.set(self.calls.get() + 1);
        self.uuids.get(mount_path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKUTIL_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>MountPoint</key>
    <string>/Volumes/Backup</string>
    <key>VolumeName</key>
    <string>Backup</string>
    <key>VolumeUUID</key>
    <string>6C1A0B2E-93C4-4F8A-9D1B-3E5F7A9C2B4D</string>
</dict>
</plist>"#;

    #[test]
    fn test_parse_volume_uuid() {
        assert_eq!(
            parse_volume_uuid(DISKUTIL_PLIST.as_bytes()).as_deref(),
            Some("6C1A0B2E-93C4-4F8A-9D1B-3E5F7A9C2B4D")
        );
        assert_eq!(parse_volume_uuid(b"not a plist"), None);
    }

    #[test]
    fn test_mount_path() {
        assert_eq!(mount_path("Macintosh HD"), "/Volumes/Macintosh HD");
    }

    #[test]
    fn test_cached_probe_queries_once() {
        let probe = CachedProbe::new(FixedProbe::new().volume("Backup", "B-1"));
        assert_eq!(probe.volume_uuid("/Volumes/Backup").as_deref(), Some("B-1"));
        assert_eq!(probe.volume_uuid("/Volumes/Backup").as_deref(), Some("B-1"));
        assert_eq!(probe.volume_uuid("/Volumes/Gone"), None);
        assert_eq!(probe.volume_uuid("/Volumes/Gone"), None);
        assert_eq!(probe.inner.calls.get(), 2);
    }
}
