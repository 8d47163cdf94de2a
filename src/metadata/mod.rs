//! Descriptor formats shared with the lifecycle and legacy buildpacks
//!
//! Lifecycle descriptors (order, group, layer sidecars, buildpack.toml)
//! are TOML; legacy manifests and override files are YAML.

pub mod buildpack;
pub mod layer;
pub mod manifest;
pub mod order;

pub use buildpack::{BuildpackDescriptor, BuildpackInfo, Dependency, Stack};
pub use layer::LayerMetadata;
pub use manifest::{BuildpackManifest, DefaultVersion, ManifestEntry, OverrideFile, OverrideManifest};
pub use order::{BuildpackRef, Group, Order};

use crate::error::{ShimError, ShimResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Decode a TOML file, naming the file on failure
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> ShimResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| ShimError::io(format!("reading {}", path.display()), e))?;
    toml::from_str(&content).map_err(|e| ShimError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Encode a value as TOML, creating parent directories as needed
pub fn write_toml<T: Serialize>(path: &Path, value: &T) -> ShimResult<()> {
    let content = toml::to_string(value).map_err(|e| ShimError::TomlSerialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_file(path, content.as_bytes())
}

/// Decode a YAML file, naming the file on failure
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> ShimResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| ShimError::io(format!("reading {}", path.display()), e))?;
    serde_yaml::from_str(&content).map_err(|e| ShimError::YamlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Encode a value as YAML, creating parent directories as needed
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> ShimResult<()> {
    let content = serde_yaml::to_string(value).map_err(|e| ShimError::YamlSerialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_file(path, content.as_bytes())
}

fn write_file(path: &Path, content: &[u8]) -> ShimResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ShimError::io(format!("creating directory {}", parent.display()), e))?;
    }
    fs::write(path, content).map_err(|e| ShimError::io(format!("writing {}", path.display()), e))
}
