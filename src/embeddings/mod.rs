// Embeddings module
// Client for the third-party embedding API

pub mod openai;

pub use openai::OpenAiClient;
