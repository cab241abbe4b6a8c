//! # Legacy Migrator Repository
//! This crate provides the traits the migration pipeline uses to talk to its
//! three stores (the legacy database, the target database and the status
//! surface), their error types, and PostgreSQL implementations of each.
pub mod errors;
pub mod interfaces;
pub mod postgres;

pub use errors::{LegacySourceError, StatusStoreError, TargetStoreError};
pub use interfaces::{LegacySource, StatusStore, TargetStore};
pub use postgres::{PostgresLegacySource, PostgresStatusStore, PostgresTargetStore};
