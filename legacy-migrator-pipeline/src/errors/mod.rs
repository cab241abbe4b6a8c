mod embedding;
mod loader;
mod migration;
mod transform;

pub use embedding::EmbeddingError;
pub use loader::LoaderError;
pub use migration::MigrationError;
pub use transform::TransformError;
