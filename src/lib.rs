//! # Relink - Photos library bookmark repair
//!
//! Repairs "missing file" references in a Photos library catalog after the
//! referenced originals were moved to a different volume.
//!
//! Relink provides:
//! - A structural decoder for CFURL bookmark blobs that works when the target is gone
//! - Path reconstruction from the catalog's volume name and relative path
//! - Sidecar-aware import grouping with resumable progress
//! - Transactional rewrite of bookmark blobs and volume foreign keys

pub mod bookmark;
pub mod record;
pub mod volume;
pub mod resolver;
pub mod storage;
pub mod grouper;
pub mod resume;
pub mod sidecar;
pub mod reconcile;
pub mod report;
pub mod repair;
pub mod importer;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use bookmark::Bookmark;
pub use record::{BookmarkRecord, ResourceLink, VolumeRecord};
pub use resolver::PathResolver;
pub use storage::CatalogStore;
pub use grouper::{GroupKey, ImportGroup};
pub use resume::ResumeState;
pub use report::RepairReport;
pub use volume::VolumeUuidProbe;

/// Result type alias for Relink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Relink operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("Unresolvable bookmark for record {primary_key}: {reason}")]
    UnresolvableBookmark { primary_key: i64, reason: String },

    #[error("Missing file: {0}")]
    MissingFile(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No bookmark found in scratch catalog for {0}")]
    UnmatchedBookmarkAfterImport(String),

    #[error("Import failed: {0}")]
    Import(String),
}
