//! Launch profile script
//!
//! The platform sources `.profile.d` scripts before starting the app; this
//! one hands control to the lifecycle launcher.

use crate::config::{LAUNCHER_BIN, LAUNCHER_DEP, LAUNCH_SCRIPT};
use crate::error::{ShimError, ShimResult};
use crate::layers::fs;
use std::path::{Path, PathBuf};

/// Contents of the launch script for a lifecycle stack id
pub fn launch_profile(stack_id: &str) -> String {
    format!(
        r#"export CNB_STACK_ID="{}"
export CNB_LAYERS_DIR="$DEPS_DIR"
export CNB_APP_DIR="$HOME"
exec $DEPS_DIR/{}/{} "$2"
"#,
        stack_id, LAUNCHER_DEP, LAUNCHER_BIN
    )
}

/// Write the launch script into the profile dir
pub fn write_launch_profile(profile_dir: &Path, stack_id: &str) -> ShimResult<PathBuf> {
    fs::ensure_dir(profile_dir)?;
    let path = profile_dir.join(LAUNCH_SCRIPT);
    std::fs::write(&path, launch_profile(stack_id))
        .map_err(|e| ShimError::io(format!("writing {}", path.display()), e))?;
    Ok(path)
}
