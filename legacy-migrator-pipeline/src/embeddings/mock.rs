use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{EmbeddingError, EmbeddingProvider};

/// Deterministic provider: the vector is derived from the input length.
///
/// Inputs containing the configured marker fail with an API error.
pub struct MockEmbeddingProvider {
    dimensions: usize,
    fail_marker: Option<String>,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail_marker: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_marker {
            if input.contains(marker.as_str()) {
                return Err(EmbeddingError::Api {
                    status: 500,
                    body: "mock failure".to_string(),
                });
            }
        }
        let seed = input.len() as f32;
        Ok((0..self.dimensions).map(|i| seed + i as f32).collect())
    }

    fn model(&self) -> &str {
        "mock-embedding"
    }
}
