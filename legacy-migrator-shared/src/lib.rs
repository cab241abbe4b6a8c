//! # Legacy Migrator Shared
//! Data structures shared by every crate of the legacy migrator: the row shapes
//! read from the legacy practice database, the row shapes written to the
//! target store, enum remapping tables, ID maps, run state and reports.
pub mod types;
pub mod uuids;

pub use types::*;
