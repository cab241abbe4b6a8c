//! Embedding side path for migrated cases.
//!
//! This module provides:
//! - [`EmbeddingProvider`] trait for abstracting the embedding API
//! - [`HttpEmbeddingProvider`] client for OpenAI-compatible `/embeddings` endpoints
//! - [`MockEmbeddingProvider`] deterministic provider for tests
//! - [`EmbeddingGenerator`] which fans requests out per batch and paces batches
//!
//! Failures here are counted and never fail the run.
mod http;
mod mock;

pub use http::HttpEmbeddingProvider;
pub use mock::MockEmbeddingProvider;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use legacy_migrator_shared::{Case, CaseEmbedding};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub use crate::errors::EmbeddingError;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Turns text into a vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model name stored next to every embedding.
    fn model(&self) -> &str;
}

/// Settings of the embedding side path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Requests issued concurrently per batch.
    pub batch_size: usize,
    /// Pause between two batches.
    pub batch_delay: Duration,
}

impl EmbeddingConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: None,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            batch_size: 100,
            batch_delay: Duration::from_millis(1_000),
        }
    }
}

/// Embeddings produced for a set of cases.
#[derive(Debug, Default)]
pub struct GeneratedEmbeddings {
    pub embeddings: Vec<CaseEmbedding>,
    /// Case id and error of every request that failed.
    pub failed: Vec<(Uuid, String)>,
}

/// Generates case embeddings batch by batch.
pub struct EmbeddingGenerator {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    batch_delay: Duration,
}

impl EmbeddingGenerator {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// Builds a generator backed by [`HttpEmbeddingProvider`].
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let provider = HttpEmbeddingProvider::new(
            &config.api_url,
            config.api_key.clone(),
            &config.model,
        );
        Self::new(Arc::new(provider), config.batch_size, config.batch_delay)
    }

    /// Requests an embedding for every case.
    ///
    /// Within a batch all requests run concurrently and are awaited together;
    /// a failed request does not affect the others. Batches are separated by
    /// the configured delay.
    pub async fn generate(&self, cases: &[&Case]) -> GeneratedEmbeddings {
        let mut generated = GeneratedEmbeddings::default();

        for (index, chunk) in cases.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let requests = chunk.iter().map(|case| async move {
                let content = case_content(case);
                let result = self.provider.embed(&content).await;
                (case.id, content, result)
            });

            for (case_id, content, result) in join_all(requests).await {
                match result {
                    Ok(embedding) if embedding.is_empty() => {
                        warn!(case_id = %case_id, "Embedding API returned an empty vector");
                        generated
                            .failed
                            .push((case_id, EmbeddingError::invalid_response("empty vector").to_string()));
                    }
                    Ok(embedding) => generated.embeddings.push(CaseEmbedding {
                        case_id,
                        content,
                        embedding,
                        model: self.provider.model().to_string(),
                        created_at: Utc::now(),
                    }),
                    Err(e) => {
                        warn!(case_id = %case_id, error = %e, "Embedding request failed");
                        generated.failed.push((case_id, e.to_string()));
                    }
                }
            }

            info!(
                batch = index,
                generated = generated.embeddings.len(),
                failed = generated.failed.len(),
                "Embedding batch finished"
            );
        }

        generated
    }
}

/// Text embedded for a case.
pub fn case_content(case: &Case) -> String {
    let mut content = format!(
        "{}\nType: {}\nStatus: {}",
        case.title,
        enum_label(&case.case_type),
        enum_label(&case.status)
    );
    if let Some(notes) = &case.notes {
        content.push_str("\nNotes: ");
        content.push_str(notes);
    }
    content
}

fn enum_label<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(label)) => label,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_migrator_shared::{CaseStatus, CaseType};

    fn case(title: &str, notes: Option<&str>) -> Case {
        Case {
            id: Uuid::new_v4(),
            legacy_project_id: 1,
            patient_id: Uuid::new_v4(),
            practice_id: Uuid::new_v4(),
            doctor_id: None,
            title: title.to_string(),
            case_type: CaseType::Crown,
            status: CaseStatus::OnHold,
            notes: notes.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_case_content() {
        assert_eq!(
            case_content(&case("Crown 14", Some("Shade A2"))),
            "Crown 14\nType: crown\nStatus: on_hold\nNotes: Shade A2"
        );
        assert_eq!(
            case_content(&case("Crown 14", None)),
            "Crown 14\nType: crown\nStatus: on_hold"
        );
    }

    #[tokio::test]
    async fn test_failures_are_settled_per_item() {
        let provider = Arc::new(MockEmbeddingProvider::new(3).failing_on("broken"));
        let generator = EmbeddingGenerator::new(provider, 2, Duration::ZERO);
        let cases = [case("ok one", None), case("broken", None), case("ok two", None)];
        let refs: Vec<&Case> = cases.iter().collect();

        let generated = generator.generate(&refs).await;

        assert_eq!(generated.embeddings.len(), 2);
        assert_eq!(generated.failed.len(), 1);
        assert_eq!(generated.failed[0].0, cases[1].id);
        assert!(generated.embeddings.iter().all(|e| e.embedding.len() == 3));
        assert_eq!(generated.embeddings[0].model, "mock-embedding");
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_are_paced() {
        let provider = Arc::new(MockEmbeddingProvider::new(2));
        let generator = EmbeddingGenerator::new(provider.clone(), 1, Duration::from_secs(1));
        let cases = [case("a", None), case("b", None), case("c", None)];
        let refs: Vec<&Case> = cases.iter().collect();

        let started = tokio::time::Instant::now();
        let generated = generator.generate(&refs).await;

        assert_eq!(generated.embeddings.len(), 3);
        assert_eq!(provider.calls(), 3);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
