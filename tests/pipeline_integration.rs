//! End-to-end tests for the extraction pipeline
//!
//! Real Anthropic provider against a wiremock server, real SQLite storage.

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flashtutor::config::PipelineConfig;
use flashtutor::pipeline::{
    FlashcardTrigger, PipelineError, CONFIRMATION_MESSAGE, GENERATION_FAILURE_MESSAGE,
    NO_FLASHCARDS_MESSAGE,
};
use flashtutor::providers::Role;
use flashtutor::storage::{ConversationStore, Flashcard, FlashcardStore};

mod common;

#[tokio::test]
async fn test_make_flashcards_on_mitosis() {
    let server = MockServer::start().await;
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": 6192,
            "messages": [{"role": "user", "content": "Make flashcards on mitosis"}],
            "tools": [{"name": "flashcard_generator"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::tool_use_body(json!({
            "topic": "Mitosis",
            "flashcards": [
                {"question": "What is prophase?", "answer": "Chromosomes condense"},
                {"question": "What is metaphase?", "answer": "Chromosomes align"}
            ]
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = common::build_pipeline(&server.uri(), &storage);
    let reply = pipeline
        .handle_turn("conv-1", "Make flashcards on mitosis")
        .await
        .unwrap();

    assert_eq!(reply.message, CONFIRMATION_MESSAGE);
    assert_eq!(reply.flashcards.as_ref().map(Vec::len), Some(2));

    let summaries = storage.list_summaries().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].topic, "Mitosis");

    let set = storage.get(&summaries[0].id).await.unwrap().unwrap();
    assert_eq!(
        set.flashcards,
        vec![
            Flashcard::new("What is prophase?", "Chromosomes condense"),
            Flashcard::new("What is metaphase?", "Chromosomes align"),
        ]
    );

    let turns = storage.list_by_conversation("conv-1").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, CONFIRMATION_MESSAGE);
}

#[tokio::test]
async fn test_explain_mitosis_gets_text_without_tool() {
    let server = MockServer::start().await;
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::text_body("Mitosis is how a cell divides.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = common::build_pipeline(&server.uri(), &storage);
    let reply = pipeline.handle_turn("conv-2", "Explain mitosis").await.unwrap();

    assert_eq!(reply.message, "Mitosis is how a cell divides.");
    assert!(reply.flashcards.is_none());
    assert!(storage.list_summaries().await.unwrap().is_empty());

    // Keyword trigger: no tool offered for a plain question.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("tools").is_none());
}

#[tokio::test]
async fn test_history_is_sent_in_order() {
    let server = MockServer::start().await;
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user", "content": "What is a cell?"},
                {"role": "assistant", "content": "The basic unit of life."},
                {"role": "user", "content": "How does it divide?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::text_body("By mitosis.")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "What is a cell?"}]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::text_body("The basic unit of life.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = common::build_pipeline(&server.uri(), &storage);
    pipeline.handle_turn("conv-3", "What is a cell?").await.unwrap();
    let reply = pipeline
        .handle_turn("conv-3", "How does it divide?")
        .await
        .unwrap();

    assert_eq!(reply.message, "By mitosis.");
    assert_eq!(storage.list_by_conversation("conv-3").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_invalid_pairs_are_dropped_and_topic_falls_back() {
    let server = MockServer::start().await;
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::tool_use_body(json!({
            "flashcards": [
                {"question": "Kept", "answer": "yes"},
                {"question": "", "answer": "dropped"},
                {"question": "Also dropped", "answer": "  "}
            ]
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = common::build_pipeline(&server.uri(), &storage);
    let reply = pipeline
        .handle_turn("conv-4", "flash cards about anything")
        .await
        .unwrap();

    assert_eq!(reply.flashcards, Some(vec![Flashcard::new("Kept", "yes")]));
    let summaries = storage.list_summaries().await.unwrap();
    assert_eq!(summaries[0].topic, "Untitled Topic");
}

#[tokio::test]
async fn test_zero_valid_pairs_stores_nothing() {
    let server = MockServer::start().await;
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::tool_use_body(json!({
            "topic": "Nothing",
            "flashcards": [{"question": "", "answer": ""}]
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = common::build_pipeline(&server.uri(), &storage);
    let reply = pipeline.handle_turn("conv-5", "flashcards").await.unwrap();

    assert_eq!(reply.message, NO_FLASHCARDS_MESSAGE);
    assert!(reply.flashcards.is_none());
    assert!(storage.list_summaries().await.unwrap().is_empty());
    assert_eq!(storage.list_by_conversation("conv-5").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_always_trigger_sends_tool_and_system_prompt() {
    let server = MockServer::start().await;
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "system": "You are a tutor.",
            "tools": [{"name": "flashcard_generator"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::text_body("Sure.")))
        .expect(1)
        .mount(&server)
        .await;

    let config = PipelineConfig {
        trigger: FlashcardTrigger::Always,
        system_prompt: Some("You are a tutor.".to_string()),
        ..Default::default()
    };
    let pipeline = common::build_pipeline_with(&server.uri(), &storage, config);
    let reply = pipeline.handle_turn("conv-6", "Explain mitosis").await.unwrap();
    assert_eq!(reply.message, "Sure.");
}

#[tokio::test]
async fn test_upstream_error_writes_nothing() {
    let server = MockServer::start().await;
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = common::build_pipeline(&server.uri(), &storage);
    let err = pipeline
        .handle_turn("conv-7", "Make flashcards on mitosis")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Generation { .. }));
    assert_eq!(err.user_message(), GENERATION_FAILURE_MESSAGE);
    assert!(storage.list_summaries().await.unwrap().is_empty());
    assert!(storage.list_by_conversation("conv-7").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_network_error_writes_nothing() {
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    // Nothing listens on port 1.
    let pipeline = common::build_pipeline("http://127.0.0.1:1", &storage);
    let err = pipeline
        .handle_turn("conv-8", "Make flashcards on mitosis")
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Sorry, something went wrong!");
    assert!(storage.list_summaries().await.unwrap().is_empty());
    assert!(storage.list_by_conversation("conv-8").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_response_is_generation_error() {
    let server = MockServer::start().await;
    let (storage, _tmp) = common::create_temp_storage();
    let storage = Arc::new(storage);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = common::build_pipeline(&server.uri(), &storage);
    let err = pipeline.handle_turn("conv-9", "hello").await.unwrap_err();
    assert!(matches!(err, PipelineError::Generation { .. }));
}
