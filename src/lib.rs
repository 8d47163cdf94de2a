//! Buildpack shim - finalize step
//!
//! Lets layer-based lifecycle buildpacks run behind the legacy sequential
//! buildpack protocol. Order fragments from earlier supply steps are
//! merged, overrides applied, earlier buildpacks' output injected as
//! layers, the lifecycle builder run, and the resulting layers migrated
//! back into the legacy deps and cache dirs.

pub mod cli;
pub mod config;
pub mod error;
pub mod finalize;
pub mod inject;
pub mod layers;
pub mod lifecycle;
pub mod metadata;
pub mod order;
pub mod overrides;
pub mod ui;

pub use error::{ShimError, ShimResult};
