//! Volume Reconciler
//!
//! After bookmarks are rewritten, each resource's volume row must describe
//! the volume the OS mounts under that name today. Stale rows are left in
//! place; the resource is repointed at a matching row, created if needed.

use serde::Serialize;

use crate::storage::CatalogStore;
use crate::volume::{self, VolumeUuidProbe};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Resource links that carry a volume foreign key
    pub checked: usize,
    /// Links moved to a different volume row
    pub repointed: usize,
    /// Volume rows inserted
    pub volumes_created: usize,
    /// Links whose volume is not mounted and could not be verified
    pub unverified: usize,
    /// Links pointing at a volume row that does not exist
    pub dangling: usize,
}

/// Repoint every resource link whose volume UUID no longer matches the OS.
///
/// Must run after all bookmark rewrites for the run, inside the caller's
/// transaction.
pub fn reconcile<P: VolumeUuidProbe>(store: &CatalogStore, probe: &P) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();
    let known_volumes = store.list_volumes()?.len();

    for link in store.list_resource_links_with_volume_or_bookmark()? {
        let Some(volume_pk) = link.volume else {
            continue;
        };
        summary.checked += 1;

        let Some(volume) = store.volume(volume_pk)? else {
            tracing::warn!(
                "Resource {} points at missing volume {}",
                link.primary_key,
                volume_pk
            );
            summary.dangling += 1;
            continue;
        };

        let Some(actual_uuid) = probe.volume_uuid(&volume::mount_path(&volume.name)) else {
            tracing::debug!("Volume {} is not mounted; leaving resource {}", volume.name, link.primary_key);
            summary.unverified += 1;
            continue;
        };

        if volume.volume_uuid_string.as_deref() == Some(actual_uuid.as_str()) {
            continue;
        }

        tracing::debug!(
            "Updating volume UUID for {} from {:?} to {}",
            volume.name,
            volume.volume_uuid_string,
            actual_uuid
        );
        let current = store.find_or_create_volume(&volume.name, &actual_uuid)?;
        store.set_resource_link_volume(link.primary_key, current.primary_key)?;
        summary.repointed += 1;
    }

    summary.volumes_created = store.list_volumes()?.len() - known_volumes;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::FixedProbe;

    #[test]
    fn test_stale_volume_gets_new_row() {
        let store = CatalogStore::open_in_memory().unwrap();
        let stale = store.insert_volume_row("Backup", "OLD-UUID");
        let bookmark = store.insert_bookmark("a.jpg", None);
        let link = store.insert_resource(Some(bookmark), Some(stale));
        let probe = FixedProbe::new().volume("Backup", "NEW-UUID");

        let summary = reconcile(&store, &probe).unwrap();
        assert_eq!(summary.repointed, 1);
        assert_eq!(summary.volumes_created, 1);

        let new_pk = store.resource_volume(link).unwrap();
        assert_ne!(new_pk, stale);
        let new_volume = store.volume(new_pk).unwrap().unwrap();
        assert_eq!(new_volume.name, "Backup");
        assert_eq!(new_volume.volume_uuid_string.as_deref(), Some("NEW-UUID"));

        // The orphaned row is untouched
        let old_volume = store.volume(stale).unwrap().unwrap();
        assert_eq!(old_volume.volume_uuid_string.as_deref(), Some("OLD-UUID"));
        assert_eq!(old_volume.assigned_uuid.as_deref(), Some("ASSIGNED"));
    }

    #[test]
    fn test_links_share_one_new_row() {
        let store = CatalogStore::open_in_memory().unwrap();
        let stale = store.insert_volume_row("Backup", "OLD");
        let a = store.insert_resource(None, Some(stale));
        let b = store.insert_resource(None, Some(stale));
        let probe = FixedProbe::new().volume("Backup", "NEW");

        let summary = reconcile(&store, &probe).unwrap();
        assert_eq!(summary.repointed, 2);
        assert_eq!(summary.volumes_created, 1);
        assert_eq!(store.resource_volume(a), store.resource_volume(b));

        // A second pass finds everything current
        let again = reconcile(&store, &probe).unwrap();
        assert_eq!(again.repointed, 0);
        assert_eq!(again.volumes_created, 0);
        assert_eq!(store.list_volumes().unwrap().len(), 2);
    }

    #[test]
    fn test_existing_matching_row_is_reused() {
        let store = CatalogStore::open_in_memory().unwrap();
        let stale = store.insert_volume_row("Backup", "OLD");
        let current = store.insert_volume_row("Backup", "NEW");
        let link = store.insert_resource(None, Some(stale));
        let probe = FixedProbe::new().volume("Backup", "NEW");

        let summary = reconcile(&store, &probe).unwrap();
        assert_eq!(summary.repointed, 1);
        assert_eq!(summary.volumes_created, 0);
        assert_eq!(store.resource_volume(link), Some(current));
    }

    #[test]
    fn test_unmounted_and_dangling_links_are_left_alone() {
        let store = CatalogStore::open_in_memory().unwrap();
        let offline = store.insert_volume_row("Offline", "U1");
        let unmounted = store.insert_resource(None, Some(offline));
        let dangling = store.insert_resource(None, Some(999));
        store.insert_resource(Some(1), None);

        let summary = reconcile(&store, &FixedProbe::new()).unwrap();
        assert_eq!(summary.checked, 2);
        assert_eq!(summary.unverified, 1);
        assert_eq!(summary.dangling, 1);
        assert_eq!(summary.repointed, 0);
        assert_eq!(store.resource_volume(unmounted), Some(offline));
        assert_eq!(store.resource_volume(dangling), Some(999));
    }
}
