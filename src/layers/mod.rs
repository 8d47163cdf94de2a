//! Lifecycle layers: durable caching and migration to the legacy layout

pub mod cache;
pub mod fs;
pub mod migrate;

pub use cache::LayerCache;
pub use migrate::{LayerMigrator, MigrationReport, APP_METADATA_DIR, CONFIG_LAYER};
