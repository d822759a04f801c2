//! Provider adapter tests against a mock HTTP server.
//!
//! Each test points an adapter at a `mockito` server through the base URL
//! override, so the real request building, authentication, parsing, and
//! retry paths run without network access or API keys in the environment.

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;

use navi::embedding::HttpEmbedder;
use navi::generation::HttpGenerator;
use navi::provider::Provider;
use navi::transport::RetryPolicy;
use navi_core::embedding::Embedder;
use navi_core::generation::Generator;
use navi_core::prompt::Prompt;
use navi_core::store::memory::InMemoryStore;
use navi_core::{AnsweringPipeline, KnowledgeEntry, NaviError};

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(1), Duration::from_secs(5))
}

fn embedder(provider: Provider, model: &str, dims: usize, url: &str) -> HttpEmbedder {
    HttpEmbedder::new(
        provider,
        model,
        dims,
        Some(url),
        Some("test-key".to_string()),
        fast_policy(),
    )
    .unwrap()
}

fn generator(provider: Provider, model: &str, url: &str) -> HttpGenerator {
    HttpGenerator::new(
        provider,
        model,
        Some(url),
        Some("test-key".to_string()),
        fast_policy(),
    )
    .unwrap()
}

fn prompt() -> Prompt {
    Prompt {
        system: "You are Navi, an AI campus navigator.".to_string(),
        user: "Context:\nLibrary is open 8am-6pm\n\nQuestion: Library hours?".to_string(),
    }
}

// ─── Embedding ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_openai_embedding_request_and_parse() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/embeddings")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "text-embedding-3-small",
            "input": "Library hours?"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]}"#)
        .expect(1)
        .create_async()
        .await;

    let vector = embedder(Provider::OpenAi, "text-embedding-3-small", 3, &server.url())
        .embed("Library hours?")
        .await
        .unwrap();

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_embedding_uses_model_path_and_key_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/text-embedding-004:embedContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "content": { "parts": [{ "text": "Where is the dean's office?" }] }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"embedding": {"values": [1.0, 0.0]}}"#)
        .create_async()
        .await;

    let vector = embedder(Provider::Gemini, "text-embedding-004", 2, &server.url())
        .embed("Where is the dean's office?")
        .await
        .unwrap();

    assert_eq!(vector, vec![1.0, 0.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ollama_embedding_without_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/embed")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"model": "nomic-embed-text", "embeddings": [[0.5, 0.5]]}"#)
        .create_async()
        .await;

    let ollama = HttpEmbedder::new(
        Provider::Ollama,
        "nomic-embed-text",
        2,
        Some(server.url().as_str()),
        None,
        fast_policy(),
    )
    .unwrap();

    assert_eq!(ollama.embed("gym").await.unwrap(), vec![0.5, 0.5]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried_then_succeeds() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/v1/embeddings")
        .with_status(503)
        .with_body("overloaded")
        .expect(1)
        .create_async()
        .await;
    let healthy = server
        .mock("POST", "/v1/embeddings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": [{"embedding": [1.0, 2.0]}]}"#)
        .expect(1)
        .create_async()
        .await;

    let vector = embedder(Provider::OpenAi, "m", 2, &server.url())
        .embed("hello")
        .await
        .unwrap();

    assert_eq!(vector, vec![1.0, 2.0]);
    failing.assert_async().await;
    healthy.assert_async().await;
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/embeddings")
        .with_status(400)
        .with_body(r#"{"error": {"message": "bad input"}}"#)
        .expect(1)
        .create_async()
        .await;

    let err = embedder(Provider::OpenAi, "m", 2, &server.url())
        .embed("hello")
        .await
        .unwrap_err();

    match err {
        NaviError::EmbeddingUnavailable(msg) => assert!(msg.contains("400"), "got: {}", msg),
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_retry_budget_is_bounded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/embeddings")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let err = embedder(Provider::OpenAi, "m", 2, &server.url())
        .embed("hello")
        .await
        .unwrap_err();

    assert!(matches!(err, NaviError::EmbeddingUnavailable(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_wrong_dimensionality_is_malformed() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/embeddings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": [{"embedding": [1.0, 2.0, 3.0]}]}"#)
        .expect(1)
        .create_async()
        .await;

    let err = embedder(Provider::OpenAi, "m", 768, &server.url())
        .embed("hello")
        .await
        .unwrap_err();

    match err {
        NaviError::EmbeddingUnavailable(msg) => {
            assert!(msg.contains("expected 768 dimensions, got 3"), "got: {}", msg)
        }
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

// ─── Generation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_gemini_generation_sends_system_instruction() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "systemInstruction": { "parts": [{ "text": "You are Navi, an AI campus navigator." }] }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates": [{"content": {"role": "model",
                "parts": [{"text": "The library is open 8am to 6pm."}]},
                "finishReason": "STOP"}]}"#,
        )
        .create_async()
        .await;

    let answer = generator(Provider::Gemini, "gemini-2.5-flash", &server.url())
        .generate(&prompt())
        .await
        .unwrap();

    assert_eq!(answer, "The library is open 8am to 6pm.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_chat_completion() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({ "model": "gpt-4o-mini" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "  8am to 6pm.\n"}}]}"#)
        .create_async()
        .await;

    let answer = generator(Provider::OpenAi, "gpt-4o-mini", &server.url())
        .generate(&prompt())
        .await
        .unwrap();

    assert_eq!(answer, "8am to 6pm.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ollama_chat_disables_streaming() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({ "model": "llama3.2", "stream": false })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": {"role": "assistant", "content": "Open until 6pm."}, "done": true}"#)
        .create_async()
        .await;

    let ollama = HttpGenerator::new(
        Provider::Ollama,
        "llama3.2",
        Some(server.url().as_str()),
        None,
        fast_policy(),
    )
    .unwrap();

    assert_eq!(ollama.generate(&prompt()).await.unwrap(), "Open until 6pm.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_blank_generation_is_a_failure() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"content": "   "}}]}"#)
        .expect(1)
        .create_async()
        .await;

    let err = generator(Provider::OpenAi, "gpt-4o-mini", &server.url())
        .generate(&prompt())
        .await
        .unwrap_err();

    assert!(matches!(err, NaviError::GenerationUnavailable(_)));
    mock.assert_async().await;
}

// ─── End to end ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_pipeline_over_http_providers() {
    let mut server = Server::new_async().await;
    let _embed = server
        .mock("POST", "/api/embed")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"embeddings": [[1.0, 0.0]]}"#)
        .create_async()
        .await;
    let chat = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::Regex("Dean's office is Room 101".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": {"content": "Room 101 in the Tech Building."}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = InMemoryStore::with_entries(vec![
        KnowledgeEntry::new("Dean's office is Room 101", vec![1.0, 0.0], "College of Engineering"),
        KnowledgeEntry::new("Library is open 8am-6pm", vec![1.0, 0.0], "General"),
    ])
    .unwrap();
    let pipeline = AnsweringPipeline::new(
        Arc::new(
            HttpEmbedder::new(
                Provider::Ollama,
                "nomic-embed-text",
                2,
                Some(server.url().as_str()),
                None,
                fast_policy(),
            )
            .unwrap(),
        ),
        Arc::new(store),
        Arc::new(
            HttpGenerator::new(
                Provider::Ollama,
                "llama3.2",
                Some(server.url().as_str()),
                None,
                fast_policy(),
            )
            .unwrap(),
        ),
    );

    let run = pipeline
        .run("[Context: College of Engineering] Where is the dean's office?")
        .await;

    assert_eq!(run.outcome.reply(), "Room 101 in the Tech Building.");
    let contents: Vec<&str> = run.retrieval.as_ref().unwrap().contents().collect();
    assert_eq!(contents, vec!["Dean's office is Room 101"]);
    chat.assert_async().await;
}
