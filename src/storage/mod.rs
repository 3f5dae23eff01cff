//! Storage Layer - typed access to a Photos catalog
//!
//! The catalog is the library's `database/Photos.sqlite`. Relink touches:
//! - ZFILESYSTEMBOOKMARK(Z_PK, ZPATHRELATIVETOVOLUME, ZBOOKMARKDATA)
//! - ZFILESYSTEMVOLUME(Z_PK, ZNAME, ZUUID, ZVOLUMEUUIDSTRING)
//! - ZINTERNALRESOURCE(Z_PK, ZFILESYSTEMBOOKMARK, ZFILESYSTEMVOLUME)
//! - Z_PRIMARYKEY(Z_ENT, Z_NAME, Z_MAX)

pub mod schema;
pub mod sqlite;

use std::path::{Path, PathBuf};

pub use sqlite::{CatalogStats, CatalogStore};

/// Location of the catalog database inside a `.photoslibrary` bundle
pub fn catalog_path(library: &Path) -> PathBuf {
    library.join("database").join("Photos.sqlite")
}
