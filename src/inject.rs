//! Legacy buildpack injection
//!
//! Output of legacy buildpacks that already ran their supply step is
//! turned into a layer of a placeholder lifecycle buildpack
//! `buildpack.<index>`, which is put at the front of the detected group.
//! The placeholder's build script does nothing, so the lifecycle accepts
//! the legacy output without running any legacy logic again.

use crate::config::FinalizeConfig;
use crate::error::{ShimError, ShimResult};
use crate::layers::fs;
use crate::metadata::{BuildpackDescriptor, BuildpackRef, Group, LayerMetadata};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the single layer each placeholder buildpack owns
pub const LEGACY_LAYER: &str = "layer";

/// Version directory of placeholder buildpacks
pub const PLACEHOLDER_VERSION: &str = "latest";

const BUILD_SCRIPT: &str = "#!/bin/bash\n";

/// Id of the placeholder buildpack for a legacy deps index
pub fn legacy_buildpack_id(index: usize) -> String {
    format!("buildpack.{}", index)
}

/// Inject every legacy buildpack below the current deps index into `group`.
///
/// Clears this buildpack's own deps slot first, then walks indices from
/// `current - 1` down to 0, skipping slots that do not exist. Returns the
/// ids that were injected, in ascending index order.
pub fn inject_legacy_buildpacks(config: &FinalizeConfig, group: &mut Group) -> ShimResult<Vec<String>> {
    let current = config.deps_position()?;
    fs::remove_all(&config.deps_slot(&config.deps_index))?;

    let mut injected = Vec::new();
    for index in (0..current).rev() {
        let legacy_dir = config.deps_slot(index.to_string());
        if !legacy_dir.exists() {
            debug!("No output for legacy buildpack {}", index);
            continue;
        }

        let id = legacy_buildpack_id(index);
        let layer_dir = config.layout.layers_dir.join(&id).join(LEGACY_LAYER);

        fs::rename(&legacy_dir, &layer_dir)?;
        LayerMetadata::legacy().write_for_layer(&layer_dir)?;
        rename_env_dir(&layer_dir)?;
        group.prepend(BuildpackRef::new(&id));
        write_placeholder(&config.layout.buildpacks_dir, &id, &config.stack_id())?;

        debug!("Injected {} from {}", id, legacy_dir.display());
        injected.push(id);
    }

    injected.reverse();
    if !injected.is_empty() {
        info!("Included legacy buildpacks: {}", injected.join(", "));
    }
    Ok(injected)
}

/// Legacy `env` dirs hold build-time variables; the lifecycle reads
/// those from `env.build`
fn rename_env_dir(layer_dir: &Path) -> ShimResult<()> {
    let env = layer_dir.join("env");
    match std::fs::symlink_metadata(&env) {
        Ok(_) => fs::rename(&env, &layer_dir.join("env.build")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ShimError::io(format!("inspecting {}", env.display()), e)),
    }
}

/// Write `<buildpacks>/<id>/latest/{buildpack.toml,bin/build}`
pub fn write_placeholder(buildpacks_dir: &Path, id: &str, stack_id: &str) -> ShimResult<PathBuf> {
    let root = buildpacks_dir.join(id).join(PLACEHOLDER_VERSION);

    BuildpackDescriptor::placeholder(id, PLACEHOLDER_VERSION, stack_id)
        .write(&root.join("buildpack.toml"))?;

    let bin = root.join("bin");
    fs::ensure_dir(&bin)?;
    let build = bin.join("build");
    std::fs::write(&build, BUILD_SCRIPT)
        .map_err(|e| ShimError::io(format!("writing {}", build.display()), e))?;
    make_executable(&build)?;

    Ok(root)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> ShimResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| ShimError::io(format!("setting permissions on {}", path.display()), e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> ShimResult<()> {
    Ok(())
}
