
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::EmbeddingConfig;
use crate::{IngestError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint. The model is a
/// fixed configuration value; requests are not retried, so any transport,
/// auth, or model failure surfaces as an [`IngestError::Embedding`].
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: String,
    model: String,
    dimension: usize,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &EmbeddingConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            agent,
        }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Generate the embedding vector for a single text input, verifying it
    /// has the configured dimensionality.
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f64>> {
        debug!(
            "Generating embedding for text ({} characters)",
            text.chars().count()
        );

        let request = EmbeddingsRequest {
            model: &self.model,
            input: text,
        };

        let url = self
            .base_url
            .join("/v1/embeddings")
            .map_err(|e| IngestError::Embedding(format!("failed to build embeddings URL: {e}")))?;

        let request_json = serde_json::to_string(&request).map_err(|e| {
            IngestError::Embedding(format!("failed to serialize embeddings request: {e}"))
        })?;

        let auth = format!("Bearer {}", self.api_key);
        let response_text = self
            .agent
            .post(url.as_str())
            .header("Authorization", &auth)
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| IngestError::Embedding(format!("embeddings request failed: {e}")))?;

        let response: EmbeddingsResponse = serde_json::from_str(&response_text).map_err(|e| {
            IngestError::Embedding(format!("malformed embeddings response: {e}"))
        })?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| {
                IngestError::Embedding("embeddings response contained no data".to_string())
            })?
            .embedding;

        if embedding.len() != self.dimension {
            return Err(IngestError::Embedding(format!(
                "embedding has {} dimensions, expected {}",
                embedding.len(),
                self.dimension
            )));
        }

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}
