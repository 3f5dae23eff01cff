//! Run reports
//!
//! Components never print. They return summaries and record every file that
//! was not repaired in a [`RepairReport`], which the CLI renders at the end.

use serde::Serialize;

use crate::reconcile::ReconcileSummary;
use crate::Error;

/// Why a record was not repaired
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidBookmark(String),
    UnresolvableBookmark(String),
    MissingFile,
    UnmatchedBookmarkAfterImport,
}

impl SkipReason {
    /// Per-record errors map to a skip reason; anything else is fatal
    pub fn from_error(error: &Error) -> Option<Self> {
        match error {
            Error::InvalidBookmark(reason) => Some(Self::InvalidBookmark(reason.clone())),
            Error::UnresolvableBookmark { reason, .. } => Some(Self::UnresolvableBookmark(reason.clone())),
            Error::MissingFile(_) => Some(Self::MissingFile),
            Error::UnmatchedBookmarkAfterImport(_) => Some(Self::UnmatchedBookmarkAfterImport),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidBookmark(_) => "invalid bookmark",
            Self::UnresolvableBookmark(_) => "unresolvable bookmark",
            Self::MissingFile => "missing file",
            Self::UnmatchedBookmarkAfterImport => "no new bookmark after import",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBookmark(detail) | Self::UnresolvableBookmark(detail) => {
                write!(f, "{}: {}", self.as_str(), detail)
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

/// A record (or path) left unrepaired
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub primary_key: Option<i64>,
    /// Resolved path, or a label from the record's fields when it did not resolve
    pub subject: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub groups_pending: usize,
    pub batches_submitted: usize,
    pub files_submitted: usize,
    /// Files already present in the scratch catalog, resubmitted only as group companions
    pub files_reused: usize,
    pub files_missing: usize,
    pub sidecars_moved: usize,
    pub stopped_at_limit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub updated: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairReport {
    /// Records that resolved to a path
    pub resolved: usize,
    pub skipped: Vec<SkippedRecord>,
    pub import: Option<ImportSummary>,
    pub rewrite: Option<RewriteSummary>,
    pub reconcile: Option<ReconcileSummary>,
}

impl RepairReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(&mut self, primary_key: Option<i64>, subject: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedRecord {
            primary_key,
            subject: subject.into(),
            reason,
        });
    }

    /// Record a per-record failure; errors without a skip reason are handed back
    pub fn skip_error(
        &mut self,
        primary_key: Option<i64>,
        subject: impl Into<String>,
        error: Error,
    ) -> Result<(), Error> {
        let Some(reason) = SkipReason::from_error(&error) else {
            return Err(error);
        };
        let subject = subject.into();
        tracing::warn!("Skipping {}: {}", subject, error);
        self.skip(primary_key, subject, reason);
        Ok(())
    }

    /// Everything not repaired, in the order it was found
    pub fn not_repaired(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn stopped_at_limit(&self) -> bool {
        self.import.as_ref().is_some_and(|i| i.stopped_at_limit)
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && !self.stopped_at_limit()
    }
}
