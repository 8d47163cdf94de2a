//! Narrow interfaces to the external lifecycle tools
//!
//! Production code runs real executables; tests substitute fakes.

use crate::error::ShimResult;
use async_trait::async_trait;
use std::path::Path;

/// Runs the lifecycle detect phase, producing group and plan metadata
#[async_trait]
pub trait Detector: Send + Sync {
    async fn run_lifecycle_detect(&self) -> ShimResult<()>;
}

/// Fetches lifecycle binaries into a directory
#[async_trait]
pub trait Installer: Send + Sync {
    /// Install the detector/builder lifecycle into `dir`
    async fn install_lifecycle(&self, dir: &Path) -> ShimResult<()>;

    /// Install the only version of dependency `name` listed by the
    /// buildpack into `dir`
    async fn install_only_version(&self, name: &str, dir: &Path) -> ShimResult<()>;
}
