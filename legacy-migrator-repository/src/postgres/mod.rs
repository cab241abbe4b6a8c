//! PostgreSQL implementations of the store interfaces.
mod connection;
mod legacy_source;
pub mod sql;
mod status_store;
mod target_store;

pub use connection::connect;
pub use legacy_source::PostgresLegacySource;
pub use status_store::PostgresStatusStore;
pub use target_store::PostgresTargetStore;
