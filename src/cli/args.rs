//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Finalize step of the legacy buildpack protocol
///
/// Runs the lifecycle detect/build phases against the staged app and
/// migrates their output back into the legacy droplet layout.
#[derive(Parser, Debug)]
#[command(name = "finalize")]
#[command(author, version, long_about = None)]
pub struct FinalizeArgs {
    /// Legacy app directory (build dir)
    pub app_dir: PathBuf,

    /// Legacy cache directory, persisted across stagings
    pub cache_dir: PathBuf,

    /// Legacy deps directory shared by all buildpacks
    pub deps_dir: PathBuf,

    /// Position of this buildpack in the deps directory
    pub deps_index: String,

    /// Directory for .profile.d scripts
    pub profile_dir: PathBuf,

    /// Platform stack name (e.g. cflinuxfs3)
    #[arg(long, env = "CF_STACK", hide = true)]
    pub stack: Option<String>,

    /// Root of the fixed lifecycle layout
    #[arg(long, env = "CNB_SHIM_HOME", default_value = "/home/vcap", hide = true)]
    pub shim_home: PathBuf,

    /// Legacy buildpack root (defaults to the parent of the executable's dir)
    #[arg(long, env = "BUILDPACK_DIR", hide = true)]
    pub buildpack_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, env = "BP_DEBUG", hide = true)]
    pub debug: bool,

    /// Increase verbosity (-v debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl FinalizeArgs {
    /// Whether debug-level logging was requested by flag or environment
    pub fn debug_logging(&self) -> bool {
        self.debug || self.verbose > 0
    }
}
