//! Resume Tracker
//!
//! A run can be interrupted at any batch. Everything the scratch catalog
//! already holds a resolvable bookmark for is considered done, so the next run
//! rebuilds this set from the scratch catalog before grouping.

use std::collections::HashSet;

use crate::resolver::PathResolver;
use crate::storage::CatalogStore;
use crate::volume::VolumeUuidProbe;
use crate::Result;

/// Paths already represented in the scratch catalog. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ResumeState {
    paths: HashSet<String>,
}

impl ResumeState {
    /// Resolve every bookmark in the scratch catalog.
    ///
    /// Records that fail to resolve are partial scratch state, not progress,
    /// and are left out.
    pub fn compute<P: VolumeUuidProbe>(scratch: &CatalogStore, resolver: &PathResolver<P>) -> Result<Self> {
        let mut paths = HashSet::new();
        for record in scratch.list_bookmark_records()? {
            match resolver.resolve(&record) {
                Ok(path) => {
                    paths.insert(path);
                }
                Err(e) => {
                    tracing::debug!("Ignoring scratch record {}: {}", record.primary_key, e);
                }
            }
        }
        tracing::debug!("Scratch catalog already holds {} paths", paths.len());
        Ok(Self { paths })
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}
