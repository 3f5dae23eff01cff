//! Repair Driver
//!
//! Two phases:
//! - **import**: resolve every record of the primary catalog, group the paths,
//!   and feed the groups that still need action to an importer working on a
//!   scratch library, a few groups per batch.
//! - **finalize**: copy the fresh bookmarks the scratch library produced back
//!   into the primary catalog and reconcile volume rows, in one transaction.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::grouper;
use crate::reconcile;
use crate::record::RepairTarget;
use crate::report::{ImportSummary, RepairReport, RewriteSummary};
use crate::resolver::PathResolver;
use crate::resume::ResumeState;
use crate::sidecar::{FileSystem, Quarantine};
use crate::storage::CatalogStore;
use crate::volume::VolumeUuidProbe;
use crate::{Error, Result};

/// Submits one batch of files to the photo library being rebuilt
pub trait ImportBatch {
    fn import_batch(&mut self, paths: &[String]) -> Result<()>;
}

impl<T: ImportBatch + ?Sized> ImportBatch for &mut T {
    fn import_batch(&mut self, paths: &[String]) -> Result<()> {
        (**self).import_batch(paths)
    }
}

/// Import phase tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOptions {
    /// Groups per import batch
    pub group_size: usize,
    /// Batches submitted before the run stops
    pub max_imports: usize,
    /// Batches between long pauses
    pub imports_before_pausing: usize,
    /// Quarantine `.AAE` sidecars while importing
    pub move_aae: bool,
    pub settle_delay: Duration,
    pub pause_delay: Duration,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            group_size: 5,
            max_imports: 10_000,
            imports_before_pausing: 250,
            move_aae: true,
            settle_delay: Duration::from_millis(250),
            pause_delay: Duration::from_secs(5),
        }
    }
}

/// Batch progress: `(batches finished, batches planned)`
pub type BatchProgress<'a> = &'a mut dyn FnMut(usize, usize);

// ========== Scan ==========

/// Resolve every bookmark record of `store`, one target per bookmark.
///
/// A bookmark shared by several resources is listed once per volume context.
/// Rows with a volume are tried first and the first that resolves wins. A
/// bookmark with no resolving row is added to `report` and left out.
pub fn collect_targets<P: VolumeUuidProbe>(
    store: &CatalogStore,
    resolver: &PathResolver<P>,
    report: &mut RepairReport,
) -> Result<Vec<RepairTarget>> {
    let mut records = store.list_bookmark_records()?;
    records.sort_by_key(|r| (r.primary_key, r.volume_name.is_none()));

    let mut targets = Vec::new();
    for rows in records.chunk_by(|a, b| a.primary_key == b.primary_key) {
        let mut first_error = None;
        for record in rows {
            match resolver.resolve(record) {
                Ok(path) => {
                    targets.push(RepairTarget {
                        primary_key: record.primary_key,
                        path,
                    });
                    first_error = None;
                    break;
                }
                Err(e) => {
                    first_error.get_or_insert((record, e));
                }
            }
        }
        if let Some((record, e)) = first_error {
            report.skip_error(Some(record.primary_key), record.label(), e)?;
        }
    }
    report.resolved = targets.len();
    tracing::info!("Resolved {} bookmark records", targets.len());
    Ok(targets)
}

// ========== Import ==========

/// Submit every pending group to `importer`, `group_size` groups at a time.
///
/// Sidecars are renamed back after every batch, whatever the outcome. An
/// import failure ends the run.
pub fn run_imports<I, F>(
    targets: &[RepairTarget],
    resume: &ResumeState,
    importer: &mut I,
    fs: &F,
    options: &RepairOptions,
    report: &mut RepairReport,
    progress: BatchProgress<'_>,
) -> Result<ImportSummary>
where
    I: ImportBatch + ?Sized,
    F: FileSystem + ?Sized,
{
    let scheduled: HashSet<String> = targets.iter().map(|t| t.path.clone()).collect();
    let keys: HashMap<&str, i64> = targets.iter().map(|t| (t.path.as_str(), t.primary_key)).collect();

    let groups = grouper::pending_groups(&scheduled, resume);
    let batches: Vec<_> = groups.chunks(options.group_size.max(1)).collect();
    let mut summary = ImportSummary {
        groups_pending: groups.len(),
        ..Default::default()
    };
    tracing::info!(
        "{} groups need importing ({} already in scratch library)",
        groups.len(),
        resume.len()
    );

    for (index, batch) in batches.iter().enumerate() {
        if summary.batches_submitted >= options.max_imports {
            tracing::info!("Stopping after {} imports", summary.batches_submitted);
            summary.stopped_at_limit = true;
            break;
        }

        let mut quarantine = Quarantine::new(fs);
        let mut to_import = Vec::new();
        for path in batch.iter().flat_map(|g| &g.paths) {
            if !fs.exists(Path::new(path)) {
                report.skip_error(
                    keys.get(path.as_str()).copied(),
                    path.as_str(),
                    Error::MissingFile(path.clone()),
                )?;
                summary.files_missing += 1;
                continue;
            }
            if resume.contains(path) {
                summary.files_reused += 1;
            }
            if options.move_aae {
                quarantine.quarantine_sidecar_of(path, &scheduled)?;
            }
            to_import.push(path.clone());
        }

        summary.sidecars_moved += quarantine.moved().len();
        if to_import.is_empty() {
            quarantine.restore()?;
            progress(index + 1, batches.len());
            continue;
        }

        tracing::debug!("Importing batch {} of {}: {:?}", index + 1, batches.len(), to_import);
        let imported = importer.import_batch(&to_import);
        if imported.is_ok() {
            thread::sleep(options.settle_delay);
        }
        let restored = quarantine.restore();
        imported?;
        restored?;

        summary.batches_submitted += 1;
        summary.files_submitted += to_import.len();
        progress(index + 1, batches.len());

        if options.imports_before_pausing > 0
            && summary.batches_submitted % options.imports_before_pausing == 0
            && index + 1 < batches.len()
        {
            tracing::info!(
                "Pausing for {:?} after {} imports",
                options.pause_delay,
                summary.batches_submitted
            );
            thread::sleep(options.pause_delay);
        }
    }

    report.import = Some(summary.clone());
    Ok(summary)
}

// ========== Finalize ==========

/// Fresh bookmark blob per resolved path in the scratch catalog
pub fn fresh_bookmarks<P: VolumeUuidProbe>(
    scratch: &CatalogStore,
    resolver: &PathResolver<P>,
) -> Result<HashMap<String, Vec<u8>>> {
    let mut fresh = HashMap::new();
    for record in scratch.list_bookmark_records()? {
        if !record.has_blob() {
            continue;
        }
        match resolver.resolve(&record) {
            Ok(path) => {
                if let Some(blob) = record.bookmark_blob {
                    fresh.insert(path, blob);
                }
            }
            Err(e) => tracing::debug!("Ignoring scratch record {}: {}", record.primary_key, e),
        }
    }
    Ok(fresh)
}

/// Overwrite the bookmark of every target the scratch catalog has a fresh
/// blob for. Targets without one are reported and left as they are.
pub fn rewrite_bookmarks<F: FileSystem + ?Sized>(
    store: &CatalogStore,
    targets: &[RepairTarget],
    fresh: &HashMap<String, Vec<u8>>,
    fs: &F,
    report: &mut RepairReport,
) -> Result<RewriteSummary> {
    let mut summary = RewriteSummary::default();
    for target in targets {
        match fresh.get(&target.path) {
            Some(blob) => {
                if store.update_bookmark(target.primary_key, blob)? {
                    tracing::debug!("Updated bookmark {} for {}", target.primary_key, target.path);
                    summary.updated += 1;
                }
            }
            None => {
                let error = if fs.exists(Path::new(&target.path)) {
                    Error::UnmatchedBookmarkAfterImport(target.path.clone())
                } else {
                    Error::MissingFile(target.path.clone())
                };
                report.skip_error(Some(target.primary_key), target.path.as_str(), error)?;
                summary.unmatched += 1;
            }
        }
    }
    Ok(summary)
}

/// Rewrite bookmarks from the scratch catalog, then reconcile volumes.
///
/// Both passes share one transaction on `store`; either both land or neither.
pub fn finalize<P, F>(
    store: &mut CatalogStore,
    scratch: &CatalogStore,
    resolver: &PathResolver<P>,
    fs: &F,
    report: &mut RepairReport,
) -> Result<()>
where
    P: VolumeUuidProbe,
    F: FileSystem + ?Sized,
{
    let targets = collect_targets(store, resolver, report)?;
    let fresh = fresh_bookmarks(scratch, resolver)?;
    tracing::info!("Scratch library holds {} fresh bookmarks", fresh.len());

    let (rewrite, reconciled) = store.with_transaction(|store| {
        let rewrite = rewrite_bookmarks(store, &targets, &fresh, fs, report)?;
        let reconciled = reconcile::reconcile(store, resolver.probe())?;
        Ok((rewrite, reconciled))
    })?;

    tracing::info!(
        "Updated {} bookmarks, repointed {} resources",
        rewrite.updated,
        reconciled.repointed
    );
    report.rewrite = Some(rewrite);
    report.reconcile = Some(reconciled);
    Ok(())
}
