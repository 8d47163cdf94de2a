//! Fixed directory layout expected by the lifecycle binaries

use std::path::{Path, PathBuf};

/// Default root of the lifecycle layout inside the staging container
pub const DEFAULT_HOME: &str = "/home/vcap";

/// Conventional directories shared with the detector and builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// App dir the lifecycle builds in
    pub app_dir: PathBuf,

    /// Layers dir the builder writes into
    pub layers_dir: PathBuf,

    /// Order/group/plan metadata
    pub metadata_dir: PathBuf,

    /// Order fragments left by supply steps
    pub order_dir: PathBuf,

    /// Lifecycle buildpacks, as `<id>/<version>/buildpack.toml`
    pub buildpacks_dir: PathBuf,
}

impl Layout {
    /// Layout rooted at an arbitrary home directory
    pub fn under(home: &Path) -> Self {
        Self {
            app_dir: home.join("app"),
            layers_dir: home.join("deps"),
            metadata_dir: home.join("metadata"),
            order_dir: home.join("order"),
            buildpacks_dir: home.join("cnbs"),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::under(Path::new(DEFAULT_HOME))
    }
}
