//! Finalize entrypoint invoked by the staging platform as
//! `finalize <app> <cache> <deps> <index> <profile>`.

use buildpack_shim::cli::FinalizeArgs;
use buildpack_shim::config::FinalizeConfig;
use buildpack_shim::error::{ShimError, ShimResult};
use buildpack_shim::finalize::Finalizer;
use buildpack_shim::lifecycle::{ExecInstaller, LifecycleDetector};
use buildpack_shim::metadata::BuildpackManifest;
use buildpack_shim::ui;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = FinalizeArgs::parse();

    let filter = if args.debug_logging() {
        EnvFilter::new("buildpack_shim=debug")
    } else {
        EnvFilter::new("buildpack_shim=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::failure(&format!("Failed finalize step: {}", e.chain()));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: FinalizeArgs) -> ShimResult<()> {
    // Lifecycle binaries live only for this invocation
    let scratch = tempfile::Builder::new()
        .prefix("lifecycle")
        .tempdir()
        .map_err(|e| ShimError::io("creating lifecycle dir", e))?;
    let config = FinalizeConfig::from_args(&args, scratch.path().join("lifecycle"))?;

    let buildpack_dir = match args.buildpack_dir {
        Some(dir) => dir,
        None => buildpack_root()?,
    };
    debug!("Buildpack root: {}", buildpack_dir.display());

    let manifest = BuildpackManifest::from_dir(&buildpack_dir)?;
    let detector = LifecycleDetector::new(
        &config,
        Box::new(ExecInstaller::for_buildpack(&buildpack_dir)),
    );

    let mut finalizer = Finalizer::new(
        config,
        Box::new(detector),
        Box::new(ExecInstaller::for_buildpack(&buildpack_dir)),
        manifest,
    );
    finalizer.run().await?;
    finalizer.cleanup_staging()
}

/// The executable lives in `<buildpack>/bin/`
fn buildpack_root() -> ShimResult<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| ShimError::io("locating executable", e))?;
    exe.parent()
        .and_then(|bin| bin.parent())
        .map(PathBuf::from)
        .ok_or_else(|| {
            ShimError::io(
                format!("resolving buildpack root from {}", exe.display()),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })
}
