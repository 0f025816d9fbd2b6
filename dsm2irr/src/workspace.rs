use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory for one request's raster files and engine output.
///
/// The unique name keeps concurrent requests from sharing an output set;
/// the directory is removed on drop unless persisted. A conversion that
/// fails mid-write therefore never leaves a half-populated output set
/// behind to be mistaken for a complete one.
pub struct RequestWorkspace {
    dir: TempDir,
}

impl RequestWorkspace {
    /// Create a uniquely named directory under `root`, creating `root`
    /// itself if missing.
    pub fn create(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .context(format!("Failed to create workspace root: {:?}", root))?;
        let dir = tempfile::Builder::new()
            .prefix("sim-")
            .tempdir_in(root)
            .context(format!("Failed to create request workspace under {:?}", root))?;
        Ok(RequestWorkspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Keep the directory on disk (to inspect a failed or interesting run)
    /// and return its path.
    pub fn persist(self) -> PathBuf {
        self.dir.into_path()
    }
}
