//! Lifecycle collaborators
//!
//! The detector, builder and dependency installer are external
//! executables. This module only sequences their invocation and turns
//! their exit status into errors.

mod builder;
mod capability;
mod detector;
mod installer;
mod process;

pub use builder::run_builder;
pub use capability::{Detector, Installer};
pub use detector::LifecycleDetector;
pub use installer::ExecInstaller;
