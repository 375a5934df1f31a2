use super::{
    FlashcardTrigger, PersistenceStage, PipelineError, Tutor, CONFIRMATION_MESSAGE,
    NO_FLASHCARDS_MESSAGE, NO_TEXT_MESSAGE,
};
use crate::config::PipelineConfig;
use crate::providers::Role;
use crate::storage::{ConversationStore, ConversationTurn, Flashcard, FlashcardStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// What the user sees after one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    /// Tutor text, confirmation, or fallback message
    pub message: String,
    /// Cards of the stored set; absent unless a non-empty set was stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashcards: Option<Vec<Flashcard>>,
}

/// Runs chat turns end to end
///
/// Turns that share a conversation id are serialized by a per-conversation
/// async lock held from the history read to the final append, so history
/// never interleaves. Different conversations run in parallel.
///
/// Each turn runs on its own task: once started it completes and persists
/// even if the caller stops waiting.
pub struct ExtractionPipeline {
    runner: Arc<TurnRunner>,
}

struct TurnRunner {
    tutor: Tutor,
    flashcards: Arc<dyn FlashcardStore>,
    conversations: Arc<dyn ConversationStore>,
    trigger: FlashcardTrigger,
    fallback_topic: String,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Holds a conversation lock handle; drops the map entry when it is the last user
struct LockLease<'a> {
    locks: &'a Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    conversation_id: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let idle = locks
            .get(self.conversation_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock) && Arc::strong_count(entry) == 2);
        if idle {
            locks.remove(self.conversation_id);
        }
    }
}

impl ExtractionPipeline {
    /// Create a pipeline over shared store handles
    pub fn new(
        tutor: Tutor,
        flashcards: Arc<dyn FlashcardStore>,
        conversations: Arc<dyn ConversationStore>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            runner: Arc::new(TurnRunner {
                tutor,
                flashcards,
                conversations,
                trigger: config.trigger,
                fallback_topic: config.fallback_topic.clone(),
                locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Handle one user prompt in a conversation
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Generation` when the history read or the
    /// model call fails (nothing is written), and
    /// `PipelineError::Persistence` when a write after a successful model
    /// call fails.
    pub async fn handle_turn(
        &self,
        conversation_id: &str,
        prompt: &str,
    ) -> std::result::Result<TurnReply, PipelineError> {
        let runner = Arc::clone(&self.runner);
        let conversation_id = conversation_id.to_string();
        let prompt = prompt.to_string();

        tokio::spawn(async move { runner.serialized_turn(&conversation_id, &prompt).await })
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Chat turn task failed");
                Err(PipelineError::Generation {
                    detail: e.to_string(),
                })
            })
    }
}

impl TurnRunner {
    async fn serialized_turn(
        &self,
        conversation_id: &str,
        prompt: &str,
    ) -> std::result::Result<TurnReply, PipelineError> {
        let lease = self.lease(conversation_id);
        let _guard = lease.lock.lock().await;
        self.run_turn(conversation_id, prompt).await
    }

    fn lease<'a>(&'a self, conversation_id: &'a str) -> LockLease<'a> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let lock = locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        LockLease {
            locks: &self.locks,
            conversation_id,
            lock,
        }
    }
    async fn run_turn(
        &self,
        conversation_id: &str,
        prompt: &str,
    ) -> std::result::Result<TurnReply, PipelineError> {
        let started_at = Utc::now();
        let want_flashcards = self.trigger.wants_flashcards(prompt);
        info!(
            conversation_id,
            prompt_len = prompt.len(),
            want_flashcards,
            "Handling chat turn"
        );

        let history = self
            .conversations
            .list_by_conversation(conversation_id)
            .await
            .map_err(|e| generation_failed(conversation_id, e))?;

        let reply = self
            .tutor
            .generate(prompt, &history, want_flashcards)
            .await
            .map_err(|e| generation_failed(conversation_id, e))?;

        let (message, stored) = match reply.tool_result {
            Some(invocation) => {
                let cards = invocation.valid_flashcards();
                if cards.is_empty() {
                    warn!(
                        conversation_id,
                        received = invocation.flashcards.len(),
                        "Flashcard invocation had no valid pairs"
                    );
                    (NO_FLASHCARDS_MESSAGE.to_string(), None)
                } else {
                    let topic = invocation.topic_or(&self.fallback_topic);
                    match self.flashcards.create(&topic, &cards).await {
                        Ok(set_id) => {
                            info!(
                                conversation_id,
                                set_id = %set_id,
                                count = cards.len(),
                                dropped = invocation.flashcards.len() - cards.len(),
                                "Stored flashcard set"
                            );
                            (CONFIRMATION_MESSAGE.to_string(), Some(cards))
                        }
                        Err(e) => {
                            error!(conversation_id, error = %e, "Failed to store flashcard set");
                            let err = PipelineError::Persistence {
                                stage: PersistenceStage::Flashcards,
                                flashcards: None,
                                detail: e.to_string(),
                            };
                            // History should show what the user was told.
                            if let Err(e) = self
                                .append_turns(conversation_id, prompt, started_at, err.user_message())
                                .await
                            {
                                warn!(conversation_id, error = %e, "Failed to record unsaved-flashcards turn");
                            }
                            return Err(err);
                        }
                    }
                }
            }
            None => {
                let text = reply
                    .text
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| NO_TEXT_MESSAGE.to_string());
                (text, None)
            }
        };

        if let Err(e) = self
            .append_turns(conversation_id, prompt, started_at, &message)
            .await
        {
            error!(conversation_id, error = %e, "Failed to append conversation turns");
            return Err(PipelineError::Persistence {
                stage: PersistenceStage::Turns,
                flashcards: stored,
                detail: e.to_string(),
            });
        }

        Ok(TurnReply {
            message,
            flashcards: stored,
        })
    }

    async fn append_turns(
        &self,
        conversation_id: &str,
        prompt: &str,
        started_at: DateTime<Utc>,
        message: &str,
    ) -> crate::error::Result<()> {
        self.conversations
            .append_many(&turn_pair(
                conversation_id,
                prompt,
                started_at,
                message,
                Utc::now(),
            ))
            .await
    }
}

/// User turn stamped at turn start, assistant turn never stamped before it
fn turn_pair(
    conversation_id: &str,
    prompt: &str,
    started_at: DateTime<Utc>,
    message: &str,
    now: DateTime<Utc>,
) -> [ConversationTurn; 2] {
    [
        ConversationTurn::new(conversation_id, Role::User, prompt, started_at),
        ConversationTurn::new(
            conversation_id,
            Role::Assistant,
            message,
            now.max(started_at),
        ),
    ]
}

fn generation_failed(conversation_id: &str, e: anyhow::Error) -> PipelineError {
    error!(conversation_id, error = %e, "Tutor generation failed");
    PipelineError::Generation {
        detail: e.to_string(),
    }
}
