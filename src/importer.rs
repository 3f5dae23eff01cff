//! Photos import adapter
//!
//! Drives Photos through `osascript`. Paths are passed as script arguments,
//! never spliced into the script text.

use std::process::Command;

use crate::repair::ImportBatch;
use crate::{Error, Result};

const IMPORT_SCRIPT: &str = r#"on run argv
    set fileList to {}
    repeat with p in argv
        set end of fileList to (POSIX file (contents of p)) as alias
    end repeat
    tell application "Photos"
        import fileList skip check duplicates true
    end tell
end run"#;

/// Imports batches into whatever library Photos has open
#[derive(Debug, Clone)]
pub struct PhotosImporter {
    program: String,
}

impl Default for PhotosImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotosImporter {
    pub fn new() -> Self {
        Self {
            program: "osascript".to_string(),
        }
    }

    fn command(&self, paths: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-e").arg(IMPORT_SCRIPT).args(paths);
        cmd
    }
}

impl ImportBatch for PhotosImporter {
    fn import_batch(&mut self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        tracing::debug!("Asking Photos to import {} files", paths.len());
        let output = self.command(paths).output()?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(Error::Import(if stderr.is_empty() {
            format!("{} exited with {}", self.program, output.status)
        } else {
            stderr
        }))
    }
}
