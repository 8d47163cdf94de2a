//! Durable layer cache
//!
//! Layers flagged `cache = true` are copied to `<cache_dir>/cnb/<buildpack>/<layer>`
//! (with the sidecar beside them) after a build, and the whole cache root is
//! moved into the layers dir before the next one. Entries are never
//! invalidated here; the lifecycle cleans up layers it no longer wants.

use super::fs;
use crate::error::{ShimError, ShimResult};
use crate::metadata::layer::sidecar_path;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Cache of lifecycle layers that outlives a single staging
#[derive(Debug, Clone)]
pub struct LayerCache {
    root: PathBuf,
}

impl LayerCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the entry for `(buildpack, layer)`
    pub fn entry_path(&self, buildpack: &str, layer: &str) -> PathBuf {
        self.root.join(buildpack).join(layer)
    }

    /// Move the cache root wholesale into the layers dir.
    ///
    /// Returns false when there is nothing to restore (first build).
    pub fn restore(&self, layers_dir: &Path) -> ShimResult<bool> {
        if !self.root.exists() {
            debug!("No layer cache at {}", self.root.display());
            return Ok(false);
        }

        info!("Restoring layer cache from {}", self.root.display());
        fs::move_dir(&self.root, layers_dir)?;
        Ok(true)
    }

    /// Store a layer dir and its sidecar, replacing any previous entry
    pub fn store(&self, buildpack: &str, layer_dir: &Path) -> ShimResult<PathBuf> {
        let layer = layer_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ShimError::io(
                    format!("caching {}: layer path has no name", layer_dir.display()),
                    std::io::Error::from(std::io::ErrorKind::InvalidInput),
                )
            })?;
        let entry = self.entry_path(buildpack, &layer);

        fs::remove_all(&entry)?;
        fs::copy_file(&sidecar_path(layer_dir), &sidecar_path(&entry))?;
        fs::copy_dir(layer_dir, &entry)?;

        debug!("Cached layer {}/{}", buildpack, layer);
        Ok(entry)
    }
}
