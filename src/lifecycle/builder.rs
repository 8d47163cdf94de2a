//! Lifecycle builder invocation

use super::process::run_streamed;
use crate::config::{FinalizeConfig, BUILDER_BIN};
use crate::error::ShimResult;
use tokio::process::Command;
use tracing::info;

/// Run `<lifecycle>/builder` against the staged app and layers dir
pub async fn run_builder(config: &FinalizeConfig) -> ShimResult<()> {
    let builder = config.lifecycle_dir.join(BUILDER_BIN);
    info!("Running lifecycle builder");

    let mut command = Command::new(&builder);
    command
        .arg("-app")
        .arg(&config.layout.app_dir)
        .arg("-buildpacks")
        .arg(&config.layout.buildpacks_dir)
        .arg("-group")
        .arg(config.group_metadata())
        .arg("-layers")
        .arg(&config.layout.layers_dir)
        .arg("-plan")
        .arg(config.plan_metadata())
        .env("CNB_STACK_ID", config.stack_id());

    run_streamed(command, &builder.display().to_string()).await
}
