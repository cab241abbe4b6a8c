//! This module defines and re-exports the store interfaces used by the pipeline.
mod legacy_source;
mod status_store;
mod target_store;

pub use legacy_source::LegacySource;
pub use status_store::StatusStore;
pub use target_store::TargetStore;
