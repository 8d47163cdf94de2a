//! Command-line surface of the finalize entrypoint

pub mod args;

pub use args::FinalizeArgs;
