use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::chunking::TextSplitter;
use crate::config::Config;
use crate::embeddings::OpenAiClient;
use crate::ingest::{EmbeddingProvider, Ingestor, VectorSink};
use crate::storage::SupabaseClient;
use crate::{IngestError, Result};

/// Summary of one completed ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub chunks: usize,
}

/// Run the full pipeline: read the input file into memory, split it into
/// overlapping chunks, embed every chunk, and persist the batch.
#[inline]
pub async fn run_ingest(config: &Config, input: &Path) -> Result<IngestSummary> {
    if !input.exists() {
        // An empty file is a valid (empty) document; a missing one is not.
        return Err(IngestError::InvalidArgument(format!(
            "input file not found: {}",
            input.display()
        )));
    }

    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    let splitter = TextSplitter::new(&config.chunking)?;
    let documents = splitter.create_documents(&text);

    if documents.is_empty() {
        info!("Input {} is empty, nothing to ingest", input.display());
        return Ok(IngestSummary { chunks: 0 });
    }

    info!(
        "Split {} into {} chunks of at most {} characters",
        input.display(),
        documents.len(),
        config.chunking.chunk_size
    );

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiClient::new(&config.embedding));
    let sink: Arc<dyn VectorSink> = Arc::new(SupabaseClient::new(&config.storage));

    Ingestor::new(provider, sink).embed_and_store(&documents).await?;

    info!(
        "Ingested {} chunks into table {}",
        documents.len(),
        config.storage.table
    );

    Ok(IngestSummary {
        chunks: documents.len(),
    })
}
