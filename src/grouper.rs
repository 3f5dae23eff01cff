//! Import Grouper
//!
//! Photos keeps the pieces of one capture under related names, e.g.
//! `IMG_2212.JPG`, `IMG_2212.MOV`, `IMG_2212.AAE`, `IMG_E2212.JPG`. They only
//! import correctly together, so paths are clustered by directory plus the
//! last four characters of the file stem.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::resume::ResumeState;

const SUFFIX_LEN: usize = 4;

/// `(directory, last four characters of the stem)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    pub directory: String,
    pub suffix: String,
}

impl GroupKey {
    pub fn for_path(path: &str) -> Self {
        let path = Path::new(path);
        let directory = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let skip = stem.chars().count().saturating_sub(SUFFIX_LEN);
        let suffix = stem.chars().skip(skip).collect();
        Self { directory, suffix }
    }
}

/// Paths that must be imported in the same batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportGroup {
    pub key: GroupKey,
    /// Sorted, without duplicates
    pub paths: Vec<String>,
}

impl ImportGroup {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Partition paths into groups, ordered by key
pub fn group<I, S>(paths: I) -> Vec<ImportGroup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: BTreeMap<GroupKey, BTreeSet<String>> = BTreeMap::new();
    for path in paths {
        let path = path.as_ref();
        groups
            .entry(GroupKey::for_path(path))
            .or_default()
            .insert(path.to_string());
    }
    groups
        .into_iter()
        .map(|(key, paths)| ImportGroup {
            key,
            paths: paths.into_iter().collect(),
        })
        .collect()
}

/// A group is done only when every member already has a fresh bookmark
pub fn needs_action(group: &ImportGroup, resume: &ResumeState) -> bool {
    !group.paths.iter().all(|path| resume.contains(path))
}

/// Groups with at least one member missing from the resume state
pub fn pending_groups<I, S>(paths: I, resume: &ResumeState) -> Vec<ImportGroup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    group(paths)
        .into_iter()
        .filter(|g| needs_action(g, resume))
        .collect()
}
