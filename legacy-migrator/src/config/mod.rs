//! Configuration module for the legacy migrator.
//! Reads settings from the environment and wires the stores into a `Migrator`.
mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{DatabaseSettings, Settings};
