//! Dependency overrides
//!
//! Legacy buildpacks may drop an `override.yml` in their deps slot to pin
//! default versions or swap dependency artifacts. Those declarations are
//! upserted into every lifecycle buildpack descriptor found on disk.
//!
//! Override files apply in ascending deps index, manifests within a file
//! in document order, so the last declaration of an `(id, version)` wins.
//! Everything is parsed before any descriptor is rewritten.

use crate::error::{ShimError, ShimResult};
use crate::metadata::{BuildpackDescriptor, OverrideFile, OverrideManifest};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const OVERRIDE_FILE: &str = "override.yml";
const DESCRIPTOR_FILE: &str = "buildpack.toml";

/// `override.yml` paths under numbered deps slots, lowest index first
pub fn discover_override_files(deps_dir: &Path) -> ShimResult<Vec<PathBuf>> {
    if !deps_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(deps_dir)
        .map_err(|e| ShimError::io(format!("reading {}", deps_dir.display()), e))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| ShimError::io(format!("reading {}", deps_dir.display()), e))?;
        let index = match entry.file_name().to_str().and_then(|n| n.parse::<usize>().ok()) {
            Some(index) => index,
            None => continue,
        };
        let path = entry.path().join(OVERRIDE_FILE);
        if path.is_file() {
            found.push((index, path));
        }
    }
    found.sort_by_key(|(index, _)| *index);

    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// `<id>/<version>/buildpack.toml` paths under the buildpacks dir, sorted
pub fn discover_descriptors(buildpacks_dir: &Path) -> ShimResult<Vec<PathBuf>> {
    if !buildpacks_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(buildpacks_dir)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            ShimError::io(format!("walking {}", buildpacks_dir.display()), e.into())
        })?;
        if entry.file_type().is_file() && entry.file_name() == DESCRIPTOR_FILE {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Upsert one override manifest into a descriptor
pub fn apply_manifest(descriptor: &mut BuildpackDescriptor, manifest: &OverrideManifest) {
    for pin in &manifest.default_versions {
        descriptor.set_default_version(&pin.name, &pin.version);
    }
    for entry in &manifest.dependencies {
        descriptor.upsert_dependency(entry.to_dependency());
    }
}

/// Apply every override file in `deps_dir` to every descriptor in
/// `buildpacks_dir`. Returns the number of descriptors rewritten.
pub fn apply_overrides(deps_dir: &Path, buildpacks_dir: &Path) -> ShimResult<usize> {
    let overrides = discover_override_files(deps_dir)?
        .iter()
        .map(|path| OverrideFile::from_file(path))
        .collect::<ShimResult<Vec<_>>>()?;

    if overrides.is_empty() {
        debug!("No override.yml found in {}", deps_dir.display());
        return Ok(0);
    }

    let mut descriptors = discover_descriptors(buildpacks_dir)?
        .into_iter()
        .map(|path| BuildpackDescriptor::from_file(&path).map(|bp| (path, bp)))
        .collect::<ShimResult<Vec<_>>>()?;

    for (path, descriptor) in &mut descriptors {
        for file in &overrides {
            for (name, manifest) in &file.manifests {
                debug!(
                    "Applying {} override from {} to {}",
                    name,
                    file.path.display(),
                    path.display()
                );
                apply_manifest(descriptor, manifest);
            }
        }
    }

    for (path, descriptor) in &descriptors {
        descriptor.write(path)?;
    }

    info!(
        "Applied {} override file(s) to {} buildpack(s)",
        overrides.len(),
        descriptors.len()
    );
    Ok(descriptors.len())
}
