
use std::env;

use thiserror::Error;
use url::Url;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;
pub const DEFAULT_TABLE: &str = "documents";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_CHUNK_SIZE: usize = 200;
const DEFAULT_CHUNK_OVERLAP: usize = 20;

/// Process-wide configuration, assembled once at startup from environment
/// variables and passed explicitly into each component.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    /// Fixed output dimensionality of the embedding model. Every vector in a
    /// run must have exactly this length.
    pub dimension: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub url: Url,
    pub api_key: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Soft maximum chunk length, in characters.
    pub chunk_size: usize,
    /// Trailing characters of one chunk repeated at the start of the next.
    pub chunk_overlap: usize,
    /// Delimiters tried in order from coarsest to finest. The empty string
    /// means "split anywhere".
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("Environment variable {0} has invalid value {1:?} (expected an integer)")]
    InvalidNumber(&'static str, String),
    #[error("Invalid URL in {0}: {1}")]
    InvalidUrl(&'static str, String),
    #[error("Invalid chunk size: must be at least 1")]
    InvalidChunkSize,
    #[error("Invalid chunk overlap: {0} (must be smaller than chunk size {1})")]
    InvalidChunkOverlap(usize, usize),
    #[error("Invalid embedding dimension: {0} (must be between 1 and 16384)")]
    InvalidEmbeddingDimension(usize),
    #[error("Invalid model name: cannot be empty")]
    InvalidModel,
    #[error("Invalid table name: cannot be empty")]
    InvalidTable,
}

impl From<ConfigError> for crate::IngestError {
    #[inline]
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl Config {
    /// Load configuration from process environment variables, failing fast
    /// before any file or network access if a required value is absent.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. The seam exists so
    /// tests can supply values without mutating process environment.
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let embedding = EmbeddingConfig {
            api_key: required(&lookup, "OPENAI_API_KEY")?,
            base_url: parse_url(
                "OPENAI_BASE_URL",
                &lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            )?,
            model: lookup("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            dimension: number(&lookup, "EMBEDDING_DIMENSION", DEFAULT_EMBEDDING_DIMENSION)?,
        };

        let storage = StorageConfig {
            url: parse_url("SUPABASE_URL", &required(&lookup, "SUPABASE_URL")?)?,
            api_key: required(&lookup, "SUPABASE_API_KEY")?,
            table: lookup("SUPABASE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        };

        let chunking = ChunkingConfig {
            chunk_size: number(&lookup, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: number(&lookup, "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            ..ChunkingConfig::default()
        };

        let config = Self {
            embedding,
            storage,
            chunking,
        };
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel);
        }

        if !(1..=16384).contains(&self.embedding.dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding.dimension,
            ));
        }

        if self.storage.table.trim().is_empty() {
            return Err(ConfigError::InvalidTable);
        }

        self.chunking.validate()
    }
}

impl ChunkingConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidChunkOverlap(
                self.chunk_overlap,
                self.chunk_size,
            ));
        }

        Ok(())
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingEnv(key))
}

fn number<F>(lookup: &F, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key, raw)),
        None => Ok(default),
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(key, raw.to_string()))
}
