//! Layer sidecar metadata
//!
//! Every layer directory `<name>/` may have a `<name>.toml` beside it
//! holding the build/launch/cache flags.

use crate::error::ShimResult;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of the sidecar file
pub const SIDECAR_EXTENSION: &str = "toml";

/// Flags controlling how the lifecycle treats a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerMetadata {
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
}

impl LayerMetadata {
    /// Flags for output deposited by a legacy buildpack: visible at build
    /// and launch, rematerialized by the supply step rather than cached
    pub fn legacy() -> Self {
        Self {
            build: true,
            launch: true,
            cache: false,
        }
    }

    pub fn from_file(path: &Path) -> ShimResult<Self> {
        super::read_toml(path)
    }

    /// Read the sidecar of a layer dir, if it has one
    pub fn for_layer(layer_dir: &Path) -> ShimResult<Option<Self>> {
        let sidecar = sidecar_path(layer_dir);
        if !sidecar.is_file() {
            return Ok(None);
        }
        Self::from_file(&sidecar).map(Some)
    }

    /// Write this metadata as the sidecar of a layer dir
    pub fn write_for_layer(&self, layer_dir: &Path) -> ShimResult<()> {
        super::write_toml(&sidecar_path(layer_dir), self)
    }
}

/// Sidecar path for a layer dir: `<dir>.toml`
pub fn sidecar_path(layer_dir: &Path) -> PathBuf {
    let mut name = OsString::from(layer_dir.as_os_str());
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    PathBuf::from(name)
}
