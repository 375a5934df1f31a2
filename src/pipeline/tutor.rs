//! Tutor client
//!
//! Builds one model request from the conversation history and the new
//! prompt, optionally offers the `flashcard_generator` tool, and classifies
//! the response into a text reply or a tool invocation.

use crate::error::{FlashtutorError, Result};
use crate::providers::{CompletionRequest, CompletionResponse, Message, Provider};
use crate::storage::ConversationTurn;
use crate::tools::flashcard_generator::{self, ToolInvocation};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Classified model output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TutorReply {
    /// First text block, if any
    pub text: Option<String>,
    /// `flashcard_generator` invocation, if the model made one
    pub tool_result: Option<ToolInvocation>,
}

/// Client for the tutor model
///
/// Performs exactly one provider call per `generate`, bounded by `timeout`.
pub struct Tutor {
    provider: Arc<dyn Provider>,
    timeout: Duration,
    system_prompt: Option<String>,
}

impl Tutor {
    /// Create a tutor over a shared provider handle
    pub fn new(provider: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            system_prompt: None,
        }
    }

    /// Send this system prompt with every call
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt.filter(|prompt| !prompt.trim().is_empty());
        self
    }

    /// Build the request for one turn
    ///
    /// History is sent in the order given (ascending), followed by the new
    /// prompt as the last user message.
    pub fn build_request(
        &self,
        prompt: &str,
        history: &[ConversationTurn],
        want_flashcards: bool,
    ) -> CompletionRequest {
        let mut messages: Vec<Message> = history.iter().map(ConversationTurn::to_message).collect();
        messages.push(Message::user(prompt));

        let tools = if want_flashcards {
            vec![flashcard_generator::definition()]
        } else {
            Vec::new()
        };

        CompletionRequest {
            system: self.system_prompt.clone(),
            messages,
            tools,
        }
    }

    /// Ask the model for a reply to `prompt`
    ///
    /// # Errors
    ///
    /// Returns `FlashtutorError::Upstream` when the call fails, exceeds the
    /// timeout, or the response holds neither text nor a flashcard
    /// invocation.
    pub async fn generate(
        &self,
        prompt: &str,
        history: &[ConversationTurn],
        want_flashcards: bool,
    ) -> Result<TutorReply> {
        let request = self.build_request(prompt, history, want_flashcards);
        debug!(
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Calling tutor model"
        );

        let response = tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| {
                FlashtutorError::Upstream(format!(
                    "model call timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })??;

        debug!(
            stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
            output_tokens = response.usage.map(|u| u.output_tokens),
            "Tutor model responded"
        );

        classify(&response)
    }
}

/// Split a response into text and flashcard invocation
///
/// A `flashcard_generator` invocation wins over text; other tool names and
/// unknown block kinds are ignored.
fn classify(response: &CompletionResponse) -> Result<TutorReply> {
    let reply = TutorReply {
        text: response.first_text().map(str::to_string),
        tool_result: response
            .find_tool_use(flashcard_generator::NAME)
            .map(ToolInvocation::from_input),
    };

    if reply.text.is_none() && reply.tool_result.is_none() {
        return Err(FlashtutorError::Upstream(
            "response contained no text or flashcard invocation".to_string(),
        )
        .into());
    }

    Ok(reply)
}
