//! Configuration for a single finalize invocation
//!
//! Every path the pipeline touches is resolved once at startup into a
//! [`FinalizeConfig`] and passed explicitly to each component.

pub mod layout;

pub use layout::Layout;

use crate::cli::FinalizeArgs;
use crate::error::{ShimError, ShimResult};
use std::path::{Path, PathBuf};

/// Namespace prefixed to legacy stack names to form lifecycle stack ids
pub const STACK_NAMESPACE: &str = "org.cloudfoundry.stacks";

/// Dependency name of the lifecycle (detector + builder) archive
pub const LIFECYCLE_DEP: &str = "lifecycle";

/// Dependency name of the launcher binary
pub const LAUNCHER_DEP: &str = "launcher";

/// Lifecycle binaries
pub const DETECTOR_BIN: &str = "detector";
pub const BUILDER_BIN: &str = "builder";
pub const LAUNCHER_BIN: &str = "launcher";

/// Name of the profile script that boots the launcher
pub const LAUNCH_SCRIPT: &str = "0_shim.sh";

/// Namespace a legacy stack name, e.g. `cflinuxfs3` -> `org.cloudfoundry.stacks.cflinuxfs3`
pub fn namespaced_stack(stack: &str) -> String {
    format!("{}.{}", STACK_NAMESPACE, stack)
}

/// Resolved paths and settings for one finalize run
#[derive(Debug, Clone)]
pub struct FinalizeConfig {
    /// Legacy app dir (final location of the app)
    pub v2_app_dir: PathBuf,

    /// Legacy cache dir (holds the durable layer cache)
    pub v2_cache_dir: PathBuf,

    /// Legacy deps dir (one slot per buildpack index)
    pub v2_deps_dir: PathBuf,

    /// Index of this buildpack, as passed on the command line
    pub deps_index: String,

    /// Profile.d dir for the launch script
    pub profile_dir: PathBuf,

    /// Fixed lifecycle layout
    pub layout: Layout,

    /// Where lifecycle binaries are installed for this run
    pub lifecycle_dir: PathBuf,

    /// Where the launcher is installed for runtime
    pub launcher_dir: PathBuf,

    /// Legacy stack name from the platform
    pub stack: String,
}

impl FinalizeConfig {
    /// Build the configuration from CLI arguments and a lifecycle scratch dir
    pub fn from_args(args: &FinalizeArgs, lifecycle_dir: PathBuf) -> ShimResult<Self> {
        let stack = args
            .stack
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(ShimError::MissingStack)?;

        Ok(Self {
            v2_app_dir: args.app_dir.clone(),
            v2_cache_dir: args.cache_dir.clone(),
            v2_deps_dir: args.deps_dir.clone(),
            deps_index: args.deps_index.clone(),
            profile_dir: args.profile_dir.clone(),
            layout: Layout::under(&args.shim_home),
            lifecycle_dir,
            launcher_dir: args.deps_dir.join(LAUNCHER_DEP),
            stack,
        })
    }

    /// Parse the deps index into a position
    pub fn deps_position(&self) -> ShimResult<usize> {
        self.deps_index
            .parse()
            .map_err(|e| ShimError::InvalidDepsIndex {
                value: self.deps_index.clone(),
                source: e,
            })
    }

    /// Lifecycle stack id for the current platform stack
    pub fn stack_id(&self) -> String {
        namespaced_stack(&self.stack)
    }

    /// Merged order consumed by the detector
    pub fn order_metadata(&self) -> PathBuf {
        self.layout.metadata_dir.join("order.toml")
    }

    /// Group selected by the detector
    pub fn group_metadata(&self) -> PathBuf {
        self.layout.metadata_dir.join("group.toml")
    }

    /// Build plan produced by the detector
    pub fn plan_metadata(&self) -> PathBuf {
        self.layout.metadata_dir.join("plan.toml")
    }

    /// Root of the durable layer cache
    pub fn layer_cache_dir(&self) -> PathBuf {
        self.v2_cache_dir.join("cnb")
    }

    /// Legacy deps slot for a buildpack index or name
    pub fn deps_slot(&self, name: impl AsRef<Path>) -> PathBuf {
        self.v2_deps_dir.join(name)
    }

    /// Directories owned by this invocation that are discarded after success
    pub fn staging_dirs(&self) -> [&Path; 3] {
        [
            &self.layout.order_dir,
            &self.layout.buildpacks_dir,
            &self.layout.metadata_dir,
        ]
    }
}
