//! Installer backed by the buildpack's dependency fetcher

use super::capability::Installer;
use super::process::run_streamed;
use crate::config::LIFECYCLE_DEP;
use crate::error::{ShimError, ShimResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// Fetcher shipped in the legacy buildpack's `bin/`
pub const INSTALL_DEPENDENCY_BIN: &str = "install-dependency";

/// Runs `<program> <name> <dir>` to fetch and unpack a dependency
#[derive(Debug, Clone)]
pub struct ExecInstaller {
    program: PathBuf,
}

impl ExecInstaller {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Installer using `<buildpack_dir>/bin/install-dependency`
    pub fn for_buildpack(buildpack_dir: &Path) -> Self {
        Self::new(buildpack_dir.join("bin").join(INSTALL_DEPENDENCY_BIN))
    }
}

#[async_trait]
impl Installer for ExecInstaller {
    async fn install_lifecycle(&self, dir: &Path) -> ShimResult<()> {
        self.install_only_version(LIFECYCLE_DEP, dir).await
    }

    async fn install_only_version(&self, name: &str, dir: &Path) -> ShimResult<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ShimError::io(format!("creating directory {}", dir.display()), e))?;

        info!("Installing {}", name);
        let mut command = Command::new(&self.program);
        command.arg(name).arg(dir);

        let label = format!("{} {} {}", self.program.display(), name, dir.display());
        run_streamed(command, &label).await
    }
}
