//! Lifecycle detector invocation

use super::capability::{Detector, Installer};
use super::process::run_streamed;
use crate::config::{FinalizeConfig, DETECTOR_BIN};
use crate::error::ShimResult;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

/// Installs the lifecycle and runs `<lifecycle>/detector`
pub struct LifecycleDetector {
    installer: Box<dyn Installer>,
    lifecycle_dir: PathBuf,
    app_dir: PathBuf,
    buildpacks_dir: PathBuf,
    order_metadata: PathBuf,
    group_metadata: PathBuf,
    plan_metadata: PathBuf,
    stack_id: String,
}

impl LifecycleDetector {
    pub fn new(config: &FinalizeConfig, installer: Box<dyn Installer>) -> Self {
        Self {
            installer,
            lifecycle_dir: config.lifecycle_dir.clone(),
            app_dir: config.layout.app_dir.clone(),
            buildpacks_dir: config.layout.buildpacks_dir.clone(),
            order_metadata: config.order_metadata(),
            group_metadata: config.group_metadata(),
            plan_metadata: config.plan_metadata(),
            stack_id: config.stack_id(),
        }
    }
}

#[async_trait]
impl Detector for LifecycleDetector {
    async fn run_lifecycle_detect(&self) -> ShimResult<()> {
        self.installer.install_lifecycle(&self.lifecycle_dir).await?;

        let detector = self.lifecycle_dir.join(DETECTOR_BIN);
        info!("Running lifecycle detector");

        let mut command = Command::new(&detector);
        command
            .arg("-app")
            .arg(&self.app_dir)
            .arg("-buildpacks")
            .arg(&self.buildpacks_dir)
            .arg("-order")
            .arg(&self.order_metadata)
            .arg("-group")
            .arg(&self.group_metadata)
            .arg("-plan")
            .arg(&self.plan_metadata)
            .env("CNB_STACK_ID", &self.stack_id);

        run_streamed(command, &detector.display().to_string()).await
    }
}
