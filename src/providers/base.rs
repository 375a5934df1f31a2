//! Base provider trait and common types for Flashtutor
//!
//! This module defines the Provider trait that model backends implement,
//! along with the message, request, and response types exchanged with them.

use crate::error::Result;
use crate::tools::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The learner
    User,
    /// The tutor
    Assistant,
}

impl Role {
    /// Stable lowercase name used on the wire and in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::FlashtutorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(crate::error::FlashtutorError::validation(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Message structure for conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use flashtutor::providers::{Message, Role};
    ///
    /// let msg = Message::user("Hello, tutor!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use flashtutor::providers::{Message, Role};
    ///
    /// let msg = Message::assistant("Hello, learner!");
    /// assert_eq!(msg.role, Role::Assistant);
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single model call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// Optional system prompt
    pub system: Option<String>,
    /// Conversation in chronological order; the last entry is the new prompt
    pub messages: Vec<Message>,
    /// Tools the model may invoke
    pub tools: Vec<Tool>,
}

/// One block of model output
///
/// The discriminant is the `type` field of the wire format. Block kinds this
/// service does not use deserialize to `Unknown` instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Free text
    Text {
        /// The text
        text: String,
    },
    /// Structured tool invocation
    ToolUse {
        /// Provider-assigned invocation id
        id: String,
        /// Name of the invoked tool
        name: String,
        /// Tool arguments as produced by the model
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Any other block kind
    #[serde(other)]
    Unknown,
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the request
    pub input_tokens: usize,
    /// Tokens generated
    pub output_tokens: usize,
}

/// Response from a provider completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    /// Output blocks in the order produced
    pub content: Vec<ContentBlock>,
    /// Why generation stopped, when reported
    pub stop_reason: Option<String>,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a response from content blocks
    ///
    /// # Examples
    ///
    /// ```
    /// use flashtutor::providers::{CompletionResponse, ContentBlock};
    ///
    /// let response = CompletionResponse::new(vec![ContentBlock::Text {
    ///     text: "Hi".to_string(),
    /// }]);
    /// assert_eq!(response.first_text(), Some("Hi"));
    /// ```
    pub fn new(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            stop_reason: None,
            usage: None,
        }
    }

    /// Input of the first tool invocation with the given name
    pub fn find_tool_use(&self, tool_name: &str) -> Option<&serde_json::Value> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } if name == tool_name => Some(input),
            ContentBlock::ToolUse { .. } | ContentBlock::Text { .. } | ContentBlock::Unknown => {
                None
            }
        })
    }

    /// Text of the first text block
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::ToolUse { .. } | ContentBlock::Unknown => None,
        })
    }
}

/// Provider trait for model backends
///
/// Implementations perform exactly one attempt per call; retry policy, if
/// any, belongs to callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation
    ///
    /// # Errors
    ///
    /// Returns `FlashtutorError::Upstream` if the call fails or the response
    /// cannot be parsed
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}
