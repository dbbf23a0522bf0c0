//! Transport tests for the OpenAI-compatible clients against a mock
//! HTTP server: request shape, response ordering, and the retry policy.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use norma::config::{ChatConfig, EmbeddingConfig};
use norma::embedding::{EmbeddingClient, OpenAiEmbeddings};
use norma::error::NormaError;
use norma::llm::{ChatModel, OpenAiChat};

fn embedding_config(api_base: String) -> EmbeddingConfig {
    EmbeddingConfig {
        api_base,
        max_retries: 2,
        timeout_secs: 5,
        ..EmbeddingConfig::default()
    }
}

fn chat_config(api_base: String) -> ChatConfig {
    ChatConfig {
        api_base,
        timeout_secs: 5,
        ..ChatConfig::default()
    }
}

#[tokio::test]
async fn embeddings_returned_in_input_order() {
    let server = MockServer::start().await;

    // Response data deliberately out of order; the client must sort by
    // the index field.
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": ["first text", "second text"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                { "object": "embedding", "index": 1, "embedding": [0.0, 1.0] },
                { "object": "embedding", "index": 0, "embedding": [1.0, 0.0] },
            ],
            "model": "text-embedding-3-small",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        OpenAiEmbeddings::new(&embedding_config(server.uri()), "test-key".to_string()).unwrap();
    let vectors = client
        .embed_batch(&["first text".to_string(), "second text".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn embeddings_retry_on_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "index": 0, "embedding": [0.5] } ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        OpenAiEmbeddings::new(&embedding_config(server.uri()), "test-key".to_string()).unwrap();
    let vectors = client
        .embed_batch(&["retry me".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![0.5]]);
}

#[tokio::test]
async fn embeddings_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        OpenAiEmbeddings::new(&embedding_config(server.uri()), "test-key".to_string()).unwrap();
    let err = client
        .embed_batch(&["rejected".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, NormaError::EmbeddingService(_)));
    // expect(1) verifies on drop that no retry happened.
}

#[tokio::test]
async fn empty_batch_skips_the_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client =
        OpenAiEmbeddings::new(&embedding_config(server.uri()), "test-key".to_string()).unwrap();
    let vectors = client.embed_batch(&[]).await.unwrap();
    assert!(vectors.is_empty());
}

#[tokio::test]
async fn chat_completion_returns_generated_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "The minimum is 6mm." } }
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiChat::new(&chat_config(server.uri()), "test-key".to_string()).unwrap();
    let text = client.complete("What is the minimum?").await.unwrap();
    assert_eq!(text, "The minimum is 6mm.");
}

#[tokio::test]
async fn chat_server_error_surfaces_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiChat::new(&chat_config(server.uri()), "test-key".to_string()).unwrap();
    let err = client.complete("anything").await.unwrap_err();
    assert!(matches!(err, NormaError::ModelInvocation(_)));
}
