#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests for the ingestion pipeline: file reading, chunking, the
// embedding request fan-out, and the single batched insert, against mock
// HTTP collaborators.

use std::io::Write;
use std::path::Path;

use serde_json::json;
use tempfile::NamedTempFile;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use embed_ingest::IngestError;
use embed_ingest::commands::run_ingest;
use embed_ingest::config::{ChunkingConfig, Config, EmbeddingConfig, StorageConfig};

fn test_config(server_url: &str) -> Config {
    Config {
        embedding: EmbeddingConfig {
            api_key: "sk-test".to_string(),
            base_url: Url::parse(server_url).expect("mock server URL should parse"),
            model: "text-embedding-ada-002".to_string(),
            dimension: 3,
        },
        storage: StorageConfig {
            url: Url::parse(server_url).expect("mock server URL should parse"),
            api_key: "service-key".to_string(),
            table: "documents".to_string(),
        },
        chunking: ChunkingConfig {
            chunk_size: 40,
            chunk_overlap: 0,
            ..ChunkingConfig::default()
        },
    }
}

fn write_input(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("can create temp file");
    file.write_all(contents.as_bytes())
        .expect("can write input file");
    file
}

async fn mock_embeddings(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3]}]
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_pipeline_stores_one_batch() {
    let server = MockServer::start().await;
    mock_embeddings(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/documents"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let input = write_input("First paragraph.\n\nSecond paragraph goes here.\n\nThird one.");
    let config = test_config(&server.uri());

    let summary = run_ingest(&config, input.path())
        .await
        .expect("pipeline should succeed");
    assert_eq!(summary.chunks, 2);

    let requests = server
        .received_requests()
        .await
        .expect("requests should be recorded");
    let insert = requests
        .iter()
        .find(|request| request.url.path() == "/rest/v1/documents")
        .expect("insert request should be sent");

    let body: serde_json::Value =
        serde_json::from_slice(&insert.body).expect("insert body should be JSON");
    let records = body.as_array().expect("insert body should be an array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["content"], "First paragraph.\n\n");
    assert_eq!(
        records[1]["content"],
        "Second paragraph goes here.\n\nThird one."
    );
    for record in records {
        assert_eq!(record["embedding"], json!([0.1, 0.2, 0.3]));
    }
}

#[tokio::test]
async fn embedding_failure_aborts_without_insert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/documents"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let input = write_input("First paragraph.\n\nSecond paragraph goes here.");
    let config = test_config(&server.uri());

    let err = run_ingest(&config, input.path())
        .await
        .expect_err("pipeline should fail");
    assert!(matches!(err, IngestError::Embedding(_)));
}

#[tokio::test]
async fn storage_failure_is_reported_without_retry() {
    let server = MockServer::start().await;
    mock_embeddings(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/documents"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let input = write_input("First paragraph.\n\nSecond paragraph goes here.\n\nThird one.");
    let config = test_config(&server.uri());

    let err = run_ingest(&config, input.path())
        .await
        .expect_err("pipeline should fail");
    assert!(matches!(err, IngestError::Storage(_)));
}

#[tokio::test]
async fn missing_input_file_is_an_invalid_argument() {
    let server = MockServer::start().await;
    let config = test_config(&server.uri());

    let err = run_ingest(&config, Path::new("does-not-exist.txt"))
        .await
        .expect_err("pipeline should fail");
    assert!(matches!(err, IngestError::InvalidArgument(_)));

    let requests = server
        .received_requests()
        .await
        .expect("requests should be recorded");
    assert!(requests.is_empty(), "no collaborator may be called");
}

#[tokio::test]
async fn empty_input_succeeds_without_network_calls() {
    let server = MockServer::start().await;
    let input = write_input("");
    let config = test_config(&server.uri());

    let summary = run_ingest(&config, input.path())
        .await
        .expect("empty input should succeed");
    assert_eq!(summary.chunks, 0);

    let requests = server
        .received_requests()
        .await
        .expect("requests should be recorded");
    assert!(requests.is_empty());
}
