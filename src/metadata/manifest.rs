//! Legacy buildpack manifests
//!
//! Covers the `manifest.yml` + `VERSION` pair of the legacy buildpack
//! itself, and the `override.yml` files earlier buildpacks drop into
//! their deps slot to pin dependency versions for everything after them.

use super::buildpack::Dependency;
use crate::config::namespaced_stack;
use crate::error::{ShimError, ShimResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File in the legacy cache dir recording which buildpack staged last
pub const BUILDPACK_METADATA_FILE: &str = "BUILDPACK_METADATA";

/// Default-version pin `{name, version}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DefaultVersion {
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
}

/// Dependency entry in legacy manifest format
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManifestEntry {
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(deserialize_with = "scalar_string")]
    pub uri: String,
    #[serde(deserialize_with = "scalar_string")]
    pub sha256: String,
    pub cf_stacks: Vec<String>,
}

/// Read any YAML scalar as its string form, so unquoted versions such as
/// `3.7` or `12` decode like quoted ones. Null reads as empty.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a scalar, found {:?}",
            other
        ))),
    }
}

impl ManifestEntry {
    /// Translate to a lifecycle dependency record, namespacing each stack
    pub fn to_dependency(&self) -> Dependency {
        Dependency {
            id: self.name.clone(),
            name: self.name.clone(),
            sha256: self.sha256.clone(),
            stacks: self.cf_stacks.iter().map(|s| namespaced_stack(s)).collect(),
            uri: self.uri.clone(),
            version: self.version.clone(),
            source: None,
            source_sha256: None,
        }
    }
}

/// Override declarations for one buildpack language
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OverrideManifest {
    pub default_versions: Vec<DefaultVersion>,
    pub dependencies: Vec<ManifestEntry>,
}

/// Parsed `override.yml`: manifests keyed by language, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideFile {
    pub path: PathBuf,
    pub manifests: Vec<(String, OverrideManifest)>,
}

impl OverrideFile {
    pub fn from_file(path: &Path) -> ShimResult<Self> {
        let mapping: serde_yaml::Mapping = super::read_yaml(path)?;
        let mut manifests = Vec::with_capacity(mapping.len());

        for (key, value) in mapping {
            let name = match key {
                serde_yaml::Value::String(name) => name,
                other => format!("{:?}", other),
            };
            let manifest: OverrideManifest =
                serde_yaml::from_value(value).map_err(|e| ShimError::YamlParse {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            debug!(
                "Override for {} from {}: {} pins, {} dependencies",
                name,
                path.display(),
                manifest.default_versions.len(),
                manifest.dependencies.len()
            );
            manifests.push((name, manifest));
        }

        Ok(Self {
            path: path.to_path_buf(),
            manifests,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ManifestHeader {
    #[serde(default)]
    language: String,
}

/// Identity of the legacy buildpack running this finalize step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackManifest {
    pub language: String,
    pub version: String,
}

impl BuildpackManifest {
    /// Load from `manifest.yml` and `VERSION` in the buildpack root
    pub fn from_dir(buildpack_dir: &Path) -> ShimResult<Self> {
        let manifest_path = buildpack_dir.join("manifest.yml");
        let header: ManifestHeader = super::read_yaml(&manifest_path)?;
        if header.language.is_empty() {
            return Err(ShimError::ManifestInvalid {
                path: manifest_path,
                reason: "missing language".to_string(),
            });
        }

        let version_path = buildpack_dir.join("VERSION");
        let version = fs::read_to_string(&version_path)
            .map_err(|e| ShimError::io(format!("reading {}", version_path.display()), e))?
            .trim()
            .to_string();

        Ok(Self {
            language: header.language,
            version,
        })
    }

    /// Record language and version in the cache dir so the next staging
    /// can tell whether the buildpack changed. No-op without a cache dir.
    pub fn store(&self, cache_dir: &Path) -> ShimResult<()> {
        if !cache_dir.is_dir() {
            debug!("No cache dir at {}, skipping buildpack metadata", cache_dir.display());
            return Ok(());
        }
        super::write_yaml(&cache_dir.join(BUILDPACK_METADATA_FILE), self)
    }
}
