//! Layer migration into the legacy deps layout
//!
//! After the builder runs, each buildpack dir under the layers dir is
//! copied to `<deps>/<buildpack>` so the droplet carries it, and every
//! layer flagged `cache = true` is persisted to the durable cache. The
//! reserved `config` dir is moved instead, and its `metadata.toml` is
//! exposed to the app.

use super::cache::LayerCache;
use super::fs;
use crate::error::{ShimError, ShimResult};
use crate::metadata::LayerMetadata;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reserved top-level entry written by the lifecycle builder
pub const CONFIG_LAYER: &str = "config";

/// App-relative dir where platform metadata is exposed to the runtime
pub const APP_METADATA_DIR: &str = ".cloudfoundry";

const CONFIG_METADATA_FILE: &str = "metadata.toml";

/// Where migrated layers go
#[derive(Debug, Clone)]
pub struct LayerMigrator<'a> {
    /// Layers dir produced by the builder
    pub layers_dir: &'a Path,

    /// Legacy deps dir receiving the layers
    pub deps_dir: &'a Path,

    /// Final (legacy) app dir
    pub app_dir: &'a Path,

    pub cache: &'a LayerCache,
}

/// What a migration did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Buildpack dirs copied into the deps dir
    pub buildpacks: Vec<String>,

    /// `(buildpack, layer)` pairs written to the cache
    pub cached: Vec<(String, String)>,

    /// Whether a config dir was relocated
    pub config_moved: bool,
}

impl LayerMigrator<'_> {
    /// Migrate every top-level entry of the layers dir
    pub fn migrate(&self) -> ShimResult<MigrationReport> {
        let mut report = MigrationReport::default();

        for (name, path) in sorted_dirs(self.layers_dir)? {
            if name == CONFIG_LAYER {
                self.move_config(&path)?;
                report.config_moved = true;
            } else {
                let cached = self.move_buildpack_layers(&name, &path)?;
                report
                    .cached
                    .extend(cached.into_iter().map(|layer| (name.clone(), layer)));
                report.buildpacks.push(name);
            }
        }

        info!(
            "Migrated {} buildpack(s), cached {} layer(s)",
            report.buildpacks.len(),
            report.cached.len()
        );
        Ok(report)
    }

    fn move_buildpack_layers(&self, buildpack: &str, path: &Path) -> ShimResult<Vec<String>> {
        let mut cached = Vec::new();

        for (layer, layer_dir) in sorted_dirs(path)? {
            match LayerMetadata::for_layer(&layer_dir)? {
                Some(metadata) if metadata.cache => {
                    self.cache.store(buildpack, &layer_dir)?;
                    cached.push(layer);
                }
                Some(_) => debug!("Layer {}/{} is not cacheable", buildpack, layer),
                None => debug!("Layer {}/{} has no metadata, not caching", buildpack, layer),
            }
        }

        fs::copy_dir(path, &self.deps_dir.join(buildpack))?;
        Ok(cached)
    }

    fn move_config(&self, path: &Path) -> ShimResult<()> {
        let target = self.deps_dir.join(CONFIG_LAYER);
        fs::remove_all(&target)?;
        fs::rename(path, &target)?;

        fs::copy_file(
            &target.join(CONFIG_METADATA_FILE),
            &self.app_dir.join(APP_METADATA_DIR).join(CONFIG_METADATA_FILE),
        )
    }
}

/// Subdirectories of `dir` by name, sorted; missing dir yields nothing
fn sorted_dirs(dir: &Path) -> ShimResult<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| ShimError::io(format!("reading {}", dir.display()), e))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ShimError::io(format!("reading {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    dirs.sort();
    Ok(dirs)
}
