
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::StorageConfig;
use crate::{IngestError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// A (content, embedding) pair destined for the vector table. Matches the
/// destination table's `content` and `embedding` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub content: String,
    pub embedding: Vec<f64>,
}

/// PostgREST client appending embedding rows to one fixed Supabase table.
/// Always an append; no upsert or merge semantics, no retries.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: Url,
    api_key: String,
    table: String,
    agent: ureq::Agent,
}

impl SupabaseClient {
    #[inline]
    pub fn new(config: &StorageConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Self {
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
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

    /// Insert the whole batch with a single call. An empty batch performs no
    /// network write.
    #[inline]
    pub fn insert_batch(&self, records: &[EmbeddingRecord]) -> Result<()> {
        if records.is_empty() {
            debug!("No records to insert");
            return Ok(());
        }

        let url = self
            .base_url
            .join(&format!("/rest/v1/{}", self.table))
            .map_err(|e| IngestError::Storage(format!("failed to build insert URL: {e}")))?;

        let body = serde_json::to_string(records)
            .map_err(|e| IngestError::Storage(format!("failed to serialize records: {e}")))?;

        debug!(
            "Inserting {} records into table {}",
            records.len(),
            self.table
        );

        let auth = format!("Bearer {}", self.api_key);
        self.agent
            .post(url.as_str())
            .header("apikey", &self.api_key)
            .header("Authorization", &auth)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .send(&body)
            .map_err(|e| IngestError::Storage(format!("batch insert failed: {e}")))?;

        debug!("Batch insert acknowledged");
        Ok(())
    }
}
