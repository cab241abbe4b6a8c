//! # Legacy Migrator Pipeline
//! This crate moves the legacy practice database into the target schema.
//! It includes modules for extracting legacy rows, reconciling identifiers
//! against what is already migrated, transforming and validating records,
//! loading them in batches, reporting progress, generating case embeddings,
//! and orchestrating the phases of a run, along with error handling.
pub mod embeddings;
pub mod errors;
pub mod extract;
pub mod loader;
pub mod orchestrator;
pub mod progress;
pub mod reconcile;
pub mod transform;
