//! Test utilities for Flashtutor
//!
//! This module provides an in-memory store with switchable failures, error
//! assertion helpers, and test configuration builders.

use crate::config::Config;
use crate::error::{FlashtutorError, Result};
use crate::providers::Role;
use crate::storage::{
    ConversationStore, ConversationTurn, Flashcard, FlashcardSet, FlashcardSetSummary,
    FlashcardStore,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory implementation of both stores
///
/// Each failure switch makes the matching operation return a
/// `FlashtutorError::Persistence` until it is switched off again.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: Mutex<Vec<FlashcardSet>>,
    turns: Mutex<Vec<ConversationTurn>>,
    fail_reads: AtomicBool,
    fail_flashcard_writes: AtomicBool,
    fail_turn_writes: AtomicBool,
    fail_assistant_turns: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every read
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail `FlashcardStore::create`
    pub fn fail_flashcard_writes(&self, fail: bool) {
        self.fail_flashcard_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail `ConversationStore::append`
    pub fn fail_turn_writes(&self, fail: bool) {
        self.fail_turn_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail any append that includes an assistant turn
    pub fn fail_assistant_turns(&self, fail: bool) {
        self.fail_assistant_turns.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of stored sets, oldest first
    pub fn sets(&self) -> Vec<FlashcardSet> {
        self.sets.lock().unwrap().clone()
    }

    /// Snapshot of one conversation's turns in append order
    pub fn turns(&self, conversation_id: &str) -> Vec<ConversationTurn> {
        self.turns
            .lock()
            .unwrap()
            .iter()
            .filter(|turn| turn.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(FlashtutorError::Persistence(format!("{} failed (injected)", what)).into());
        }
        Ok(())
    }
}

#[async_trait]
impl FlashcardStore for MemoryStore {
    async fn create(&self, topic: &str, flashcards: &[Flashcard]) -> Result<String> {
        Self::check(&self.fail_flashcard_writes, "create")?;
        let id = uuid::Uuid::new_v4().to_string();
        self.sets.lock().unwrap().push(FlashcardSet {
            id: id.clone(),
            topic: topic.to_string(),
            flashcards: flashcards.to_vec(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<FlashcardSet>> {
        Self::check(&self.fail_reads, "get")?;
        Ok(self
            .sets
            .lock()
            .unwrap()
            .iter()
            .find(|set| set.id == id)
            .cloned())
    }

    async fn list_summaries(&self) -> Result<Vec<FlashcardSetSummary>> {
        Self::check(&self.fail_reads, "list")?;
        Ok(self
            .sets
            .lock()
            .unwrap()
            .iter()
            .map(FlashcardSetSummary::from)
            .collect())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn append(&self, turn: &ConversationTurn) -> Result<()> {
        self.append_many(std::slice::from_ref(turn)).await
    }

    async fn append_many(&self, turns: &[ConversationTurn]) -> Result<()> {
        Self::check(&self.fail_turn_writes, "append")?;
        if turns.iter().any(|turn| turn.role == Role::Assistant) {
            Self::check(&self.fail_assistant_turns, "append assistant turn")?;
        }
        self.turns.lock().unwrap().extend_from_slice(turns);
        Ok(())
    }

    async fn list_by_conversation(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        Self::check(&self.fail_reads, "list_by_conversation")?;
        Ok(self.turns(conversation_id))
    }
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with an API key set
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.anthropic.api_key = Some("sk-test".to_string());
    config
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
provider:
  type: anthropic
  anthropic:
    model: claude-3-5-sonnet-20241022
    max_tokens: 1024
    timeout_seconds: 10

pipeline:
  trigger: always
  fallback_topic: Misc

server:
  bind: 0.0.0.0:8080

logging:
  level: debug
  json_format: true
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let id = store
            .create("Cells", &[Flashcard::new("ATP", "Energy")])
            .await
            .unwrap();
        assert_eq!(store.get(&id).await.unwrap().unwrap().topic, "Cells");
        assert_eq!(store.list_summaries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_failure_switches() {
        let store = MemoryStore::new();
        store.fail_flashcard_writes(true);
        assert_error_contains(store.create("x", &[]).await, "injected");
        store.fail_flashcard_writes(false);
        assert!(store.create("x", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_store_rejects_whole_batch() {
        let store = MemoryStore::new();
        store.fail_assistant_turns(true);
        let now = Utc::now();
        let result = store
            .append_many(&[
                ConversationTurn::new("c1", Role::User, "hello", now),
                ConversationTurn::new("c1", Role::Assistant, "hi", now),
            ])
            .await;

        assert_error_contains(result, "injected");
        assert!(store.turns("c1").is_empty());
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: Result<()> = Err(FlashtutorError::Config("different error".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_test_config_validates() {
        let config = test_config();
        assert_eq!(config.provider.provider_type, "anthropic");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_config_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.fallback_topic, "Misc");
        assert!(config.logging.json_format);
    }
}
