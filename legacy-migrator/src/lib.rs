//! # Legacy Migrator
//!
//! Migrates the legacy practice database into the Supabase-hosted Postgres
//! target.
//!
//! ## Modules
//!
//! - [`config`]: Environment settings and dependency wiring
//! - [`errors`]: Error types for the binary

pub mod config;
pub mod errors;

pub use config::{Dependencies, Settings};
pub use errors::{AppError, ConfigError};
