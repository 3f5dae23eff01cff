//! Sidecar Quarantine
//!
//! Edit-history sidecars (`.AAE`) make Photos import a file as an edited
//! asset, which breaks bookmark matching. While a batch is imported the
//! sidecar is renamed to `<name>.AAE.bak` and renamed back afterwards.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::Result;

pub const SIDECAR_EXTENSIONS: &[&str] = &["AAE", "aae"];
pub const QUARANTINE_SUFFIX: &str = ".bak";

/// The file operations quarantine needs
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// The local file system
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedSidecar {
    pub original: PathBuf,
    pub quarantined: PathBuf,
}

/// Sidecars moved aside for one batch.
///
/// Every moved file is renamed back exactly once, by [`Quarantine::restore`]
/// or, failing that, when the quarantine is dropped.
pub struct Quarantine<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    moved: Vec<MovedSidecar>,
}

impl<'a, F: FileSystem + ?Sized> Quarantine<'a, F> {
    pub fn new(fs: &'a F) -> Self {
        Self { fs, moved: Vec::new() }
    }

    /// Move aside the sidecar of `path`, unless `keep` schedules that sidecar
    /// for import itself. Returns the move, if one happened.
    pub fn quarantine_sidecar_of(&mut self, path: &str, keep: &HashSet<String>) -> Result<Option<&MovedSidecar>> {
        let path = Path::new(path);
        if !self.fs.exists(path) {
            return Ok(None);
        }

        for ext in SIDECAR_EXTENSIONS {
            let sidecar = path.with_extension(ext);
            if !self.fs.exists(&sidecar) {
                continue;
            }
            if keep.contains(sidecar.to_string_lossy().as_ref()) {
                tracing::debug!("Keeping {} for import", sidecar.display());
                return Ok(None);
            }

            let mut quarantined = sidecar.clone().into_os_string();
            quarantined.push(QUARANTINE_SUFFIX);
            let quarantined = PathBuf::from(quarantined);

            tracing::debug!("Moving {} to {}", sidecar.display(), quarantined.display());
            self.fs.rename(&sidecar, &quarantined)?;
            self.moved.push(MovedSidecar {
                original: sidecar,
                quarantined,
            });
            return Ok(self.moved.last());
        }
        Ok(None)
    }

    pub fn moved(&self) -> &[MovedSidecar] {
        &self.moved
    }

    /// Rename every quarantined sidecar back. Keeps going past failures and
    /// reports the first one.
    pub fn restore(mut self) -> Result<usize> {
        self.restore_all()
    }

    fn restore_all(&mut self) -> Result<usize> {
        let mut first_error = None;
        let mut restored = 0;
        for moved in self.moved.drain(..) {
            tracing::debug!("Moving {} back to {}", moved.quarantined.display(), moved.original.display());
            match self.fs.rename(&moved.quarantined, &moved.original) {
                Ok(()) => restored += 1,
                Err(e) => {
                    tracing::error!(
                        "Failed to restore {} from {}: {}",
                        moved.original.display(),
                        moved.quarantined.display(),
                        e
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(restored),
        }
    }
}

impl<F: FileSystem + ?Sized> Drop for Quarantine<'_, F> {
    fn drop(&mut self) {
        if !self.moved.is_empty() {
            // Errors are already logged by restore_all
            let _ = self.restore_all();
        }
    }
}
