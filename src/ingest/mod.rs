
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::chunking::Document;
use crate::embeddings::OpenAiClient;
use crate::storage::{EmbeddingRecord, SupabaseClient};
use crate::{IngestError, Result};

/// Black-box embedding collaborator: text in, fixed-length vector out.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;
}

/// Black-box storage collaborator: append a batch of records.
#[async_trait]
pub trait VectorSink: Send + Sync {
    async fn insert_batch(&self, records: &[EmbeddingRecord]) -> Result<()>;
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let client = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || client.generate_embedding(&text))
            .await
            .map_err(|e| IngestError::Embedding(format!("embedding task failed: {e}")))?
    }
}

#[async_trait]
impl VectorSink for SupabaseClient {
    async fn insert_batch(&self, records: &[EmbeddingRecord]) -> Result<()> {
        let client = self.clone();
        let records = records.to_vec();
        tokio::task::spawn_blocking(move || client.insert_batch(&records))
            .await
            .map_err(|e| IngestError::Storage(format!("storage task failed: {e}")))?
    }
}

/// Orchestrates one batch: embed every chunk, then persist all records with
/// a single insert.
pub struct Ingestor {
    provider: Arc<dyn EmbeddingProvider>,
    sink: Arc<dyn VectorSink>,
}

impl Ingestor {
    #[inline]
    pub fn new(provider: Arc<dyn EmbeddingProvider>, sink: Arc<dyn VectorSink>) -> Self {
        Self { provider, sink }
    }

    /// Request one embedding per chunk concurrently, join the results, and
    /// submit the whole batch in one insert. Any embedding failure or the
    /// insert failing aborts the run; partial results are never persisted.
    /// An empty chunk list succeeds without touching storage.
    #[inline]
    pub async fn embed_and_store(&self, chunks: &[Document]) -> Result<()> {
        if chunks.is_empty() {
            info!("No chunks to ingest");
            return Ok(());
        }

        debug!("Requesting embeddings for {} chunks", chunks.len());

        let tasks: Vec<_> = chunks
            .iter()
            .map(|chunk| {
                let provider = Arc::clone(&self.provider);
                let content = chunk.content.clone();
                tokio::spawn(async move {
                    let embedding = provider.embed(&content).await?;
                    Ok::<_, IngestError>(EmbeddingRecord { content, embedding })
                })
            })
            .collect();

        let joined = try_join_all(tasks)
            .await
            .map_err(|e| IngestError::Embedding(format!("embedding task panicked: {e}")))?;
        let records = joined.into_iter().collect::<Result<Vec<_>>>()?;

        verify_uniform_dimension(&records)?;

        self.sink.insert_batch(&records).await?;
        info!("Stored {} records", records.len());
        Ok(())
    }
}

/// Every record in one run must carry a vector of the same fixed length.
fn verify_uniform_dimension(records: &[EmbeddingRecord]) -> Result<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };

    let expected = first.embedding.len();
    for record in records {
        if record.embedding.len() != expected {
            return Err(IngestError::Embedding(format!(
                "inconsistent embedding dimensions: expected {}, got {}",
                expected,
                record.embedding.len()
            )));
        }
    }

    Ok(())
}
