use flashtutor::config::{AnthropicConfig, PipelineConfig};
use flashtutor::pipeline::{ExtractionPipeline, Tutor};
use flashtutor::providers::AnthropicProvider;
use flashtutor::storage::SqliteStorage;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("flashtutor.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Anthropic settings pointed at a mock server
#[allow(dead_code)]
pub fn anthropic_config(api_base: &str) -> AnthropicConfig {
    AnthropicConfig {
        api_key: Some("sk-test".to_string()),
        api_base: api_base.to_string(),
        timeout_seconds: 5,
        ..Default::default()
    }
}

/// Pipeline over a real provider and real SQLite storage
#[allow(dead_code)]
pub fn build_pipeline(api_base: &str, storage: &Arc<SqliteStorage>) -> ExtractionPipeline {
    build_pipeline_with(api_base, storage, PipelineConfig::default())
}

#[allow(dead_code)]
pub fn build_pipeline_with(
    api_base: &str,
    storage: &Arc<SqliteStorage>,
    config: PipelineConfig,
) -> ExtractionPipeline {
    let provider =
        AnthropicProvider::new(anthropic_config(api_base)).expect("failed to create provider");
    let tutor = Tutor::new(Arc::new(provider), Duration::from_secs(5))
        .with_system_prompt(config.system_prompt.clone());
    ExtractionPipeline::new(tutor, storage.clone(), storage.clone(), &config)
}

/// Messages API body with a single text block
#[allow(dead_code)]
pub fn text_body(text: &str) -> Value {
    json!({
        "id": "msg_text",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-sonnet-20241022",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 12, "output_tokens": 8}
    })
}

/// Messages API body with a `flashcard_generator` invocation
#[allow(dead_code)]
pub fn tool_use_body(input: Value) -> Value {
    json!({
        "id": "msg_tool",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-sonnet-20241022",
        "content": [
            {"type": "text", "text": "I'll create flashcards for you."},
            {
                "type": "tool_use",
                "id": "toolu_01",
                "name": "flashcard_generator",
                "input": input
            }
        ],
        "stop_reason": "tool_use",
        "usage": {"input_tokens": 40, "output_tokens": 120}
    })
}
