//! `buildpack.toml` descriptor of a lifecycle buildpack

use crate::error::ShimResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed `buildpack.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackDescriptor {
    /// Identity of the buildpack
    pub buildpack: BuildpackInfo,

    /// Stacks the buildpack runs on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<Stack>,

    /// Packaging and dependency metadata
    #[serde(default, skip_serializing_if = "BuildpackMetadata::is_empty")]
    pub metadata: BuildpackMetadata,

    /// Top-level keys not modelled above (`api`, `order`, ...), kept verbatim
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// `[buildpack]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackInfo {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    /// `clear-env`, `homepage`, `keywords` and the like
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// `[[stacks]]` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,

    #[serde(flatten)]
    pub extra: toml::Table,
}

/// `[metadata]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_package: Option<String>,

    /// Default version per module name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_versions: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,

    #[serde(flatten)]
    pub extra: toml::Table,
}

impl BuildpackMetadata {
    fn is_empty(&self) -> bool {
        self.include_files.is_empty()
            && self.pre_package.is_none()
            && self.default_versions.is_empty()
            && self.dependencies.is_empty()
            && self.extra.is_empty()
    }
}

/// `[[metadata.dependencies]]` entry; identified by `(id, version)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub sha256: String,

    #[serde(default)]
    pub stacks: Vec<String>,

    #[serde(default)]
    pub uri: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,
}

impl Dependency {
    /// Whether two records describe the same dependency release
    pub fn same_release(&self, other: &Dependency) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl BuildpackDescriptor {
    pub fn from_file(path: &Path) -> ShimResult<Self> {
        super::read_toml(path)
    }

    pub fn write(&self, path: &Path) -> ShimResult<()> {
        super::write_toml(path, self)
    }

    /// Minimal descriptor for a buildpack that only declares its identity
    /// and a single supported stack
    pub fn placeholder(id: &str, version: &str, stack_id: &str) -> Self {
        Self {
            buildpack: BuildpackInfo {
                id: id.to_string(),
                name: id.to_string(),
                version: version.to_string(),
                ..BuildpackInfo::default()
            },
            stacks: vec![Stack {
                id: stack_id.to_string(),
                ..Stack::default()
            }],
            ..Self::default()
        }
    }

    /// Set or replace the default version of a module
    pub fn set_default_version(&mut self, name: &str, version: &str) {
        self.metadata
            .default_versions
            .insert(name.to_string(), version.to_string());
    }

    /// Replace the dependency with the same `(id, version)` in place, or
    /// append it when no such release is listed
    pub fn upsert_dependency(&mut self, dependency: Dependency) {
        let deps = &mut self.metadata.dependencies;
        match deps.iter_mut().find(|d| d.same_release(&dependency)) {
            Some(existing) => *existing = dependency,
            None => deps.push(dependency),
        }
    }
}
