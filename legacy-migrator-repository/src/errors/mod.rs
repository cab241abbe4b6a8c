//! Error types for the legacy migrator repository.
//! Consolidates and re-exports the errors of each store.
mod legacy_source;
mod status_store;
mod target_store;

pub use legacy_source::LegacySourceError;
pub use status_store::StatusStoreError;
pub use target_store::TargetStoreError;
