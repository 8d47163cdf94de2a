//! Finalize pipeline
//!
//! Sequences the merger, override engine, injector, lifecycle tools and
//! layer migration in a fixed order. The first failing phase aborts the
//! run and is reported as `failed to <phase>`.

mod phase;
mod profile;

pub use phase::Phase;
pub use profile::{launch_profile, write_launch_profile};

use crate::config::{FinalizeConfig, LAUNCHER_DEP};
use crate::error::ShimResult;
use crate::inject::inject_legacy_buildpacks;
use crate::layers::{fs, LayerCache, LayerMigrator, MigrationReport};
use crate::lifecycle::{run_builder, Detector, Installer};
use crate::metadata::{BuildpackManifest, Group, Order};
use crate::order::merge_order_dir;
use crate::overrides::apply_overrides;
use crate::ui;
use tracing::{debug, info};

/// What the pipeline has done so far
#[derive(Debug, Default)]
pub struct FinalizeState {
    /// Merged order written for the detector
    pub order: Option<Order>,

    /// Descriptors rewritten by overrides
    pub overridden: usize,

    /// Whether detect had to run
    pub detected: bool,

    /// Final group after legacy injection
    pub group: Option<Group>,

    /// Placeholder buildpacks put in front of the group
    pub injected: Vec<String>,

    /// Whether a layer cache from a previous staging was restored
    pub cache_restored: bool,

    pub migration: Option<MigrationReport>,

    /// Phases that completed, in order
    pub completed: Vec<Phase>,
}

/// Drives one finalize invocation
pub struct Finalizer {
    config: FinalizeConfig,
    detector: Box<dyn Detector>,
    installer: Box<dyn Installer>,
    manifest: BuildpackManifest,
    cache: LayerCache,
    state: FinalizeState,
}

impl Finalizer {
    pub fn new(
        config: FinalizeConfig,
        detector: Box<dyn Detector>,
        installer: Box<dyn Installer>,
        manifest: BuildpackManifest,
    ) -> Self {
        let cache = LayerCache::new(config.layer_cache_dir());
        Self {
            config,
            detector,
            installer,
            manifest,
            cache,
            state: FinalizeState::default(),
        }
    }

    pub fn config(&self) -> &FinalizeConfig {
        &self.config
    }

    pub fn state(&self) -> &FinalizeState {
        &self.state
    }

    /// Run every phase in order, stopping at the first failure
    pub async fn run(&mut self) -> ShimResult<()> {
        info!(
            "Finalizing {} {} at deps index {}",
            self.manifest.language, self.manifest.version, self.config.deps_index
        );

        for phase in Phase::ALL {
            ui::section(phase.title());
            self.run_phase(phase).await.map_err(|e| e.in_phase(phase))?;
            self.state.completed.push(phase);
        }
        Ok(())
    }

    /// Discard the staging dirs owned by this run.
    ///
    /// Only called after a successful run so failed stagings can be inspected.
    pub fn cleanup_staging(&self) -> ShimResult<()> {
        for dir in self.config.staging_dirs() {
            debug!("Removing {}", dir.display());
            fs::remove_all(dir)?;
        }
        Ok(())
    }

    async fn run_phase(&mut self, phase: Phase) -> ShimResult<()> {
        let config = &self.config;
        match phase {
            Phase::RemoveStaleAppMarker => fs::remove_all(&config.v2_app_dir),

            Phase::MergeOrder => {
                let order = merge_order_dir(&config.layout.order_dir)?;
                order.write(&config.order_metadata())?;
                ui::detail(&format!("{} group(s) in order", order.groups.len()));
                self.state.order = Some(order);
                Ok(())
            }

            Phase::ApplyOverrides => {
                self.state.overridden =
                    apply_overrides(&config.v2_deps_dir, &config.layout.buildpacks_dir)?;
                Ok(())
            }

            Phase::RunDetectIfNeeded => {
                if config.group_metadata().exists() && config.plan_metadata().exists() {
                    debug!("Group and plan already present, skipping detect");
                    return Ok(());
                }
                self.detector.run_lifecycle_detect().await?;
                self.state.detected = true;
                Ok(())
            }

            Phase::InjectLegacyBuildpacks => {
                let path = config.group_metadata();
                let mut group = Group::from_file(&path)?;
                self.state.injected = inject_legacy_buildpacks(config, &mut group)?;
                group.write(&path)?;
                ui::detail(&format!("Group: {}", group.ids().join(", ")));
                self.state.group = Some(group);
                Ok(())
            }

            Phase::InstallLifecycleBinaries => {
                self.installer.install_lifecycle(&config.lifecycle_dir).await
            }

            Phase::RestoreCache => {
                self.state.cache_restored = self.cache.restore(&config.layout.layers_dir)?;
                Ok(())
            }

            Phase::RunBuild => run_builder(config).await,

            Phase::InstallLauncher => {
                self.installer
                    .install_only_version(LAUNCHER_DEP, &config.launcher_dir)
                    .await
            }

            Phase::RelocateApp => fs::rename(&config.layout.app_dir, &config.v2_app_dir),

            Phase::MigrateLayers => {
                let migrator = LayerMigrator {
                    layers_dir: &config.layout.layers_dir,
                    deps_dir: &config.v2_deps_dir,
                    app_dir: &config.v2_app_dir,
                    cache: &self.cache,
                };
                let report = migrator.migrate()?;
                if !report.config_moved {
                    ui::warning("Builder produced no launch metadata");
                }
                self.state.migration = Some(report);
                Ok(())
            }

            Phase::PersistManifestMetadata => self.manifest.store(&config.v2_cache_dir),

            Phase::WriteLaunchProfile => {
                write_launch_profile(&config.profile_dir, &config.stack_id())?;
                Ok(())
            }
        }
    }
}
