//! The `flashcard_generator` tool
//!
//! Defines the schema offered to the model and turns the arguments of a
//! `flashcard_generator` invocation into validated flashcards.
//!
//! Input is read leniently: elements whose `question` or `answer` is
//! missing, not a string, or blank after trimming are dropped and the rest
//! are kept in order. A malformed invocation yields zero cards, never an
//! error.

use super::Tool;
use crate::storage::Flashcard;
use serde_json::{json, Value};

/// Tool name as seen by the model
pub const NAME: &str = "flashcard_generator";

const DESCRIPTION: &str = "Generate flashcards from text or a specific topic. \
Only use this tool if the user explicitly asks for flashcards or provides content \
suitable for flashcard generation.";

/// Build the tool definition
pub fn definition() -> Tool {
    Tool::new(
        NAME,
        DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "flashcards": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": { "type": "string", "description": "Flashcard term" },
                            "answer": { "type": "string", "description": "Flashcard definition" }
                        },
                        "required": ["question", "answer"]
                    }
                },
                "topic": {
                    "type": "string",
                    "description": "Topic related to the flashcards"
                }
            },
            "required": ["flashcards"]
        }),
    )
}

/// One raw `{question, answer}` element as produced by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAnswer {
    /// `question` when it was a string
    pub question: Option<String>,
    /// `answer` when it was a string
    pub answer: Option<String>,
}

impl QuestionAnswer {
    /// Map to a flashcard when both fields carry text
    pub fn to_flashcard(&self) -> Option<Flashcard> {
        let question = self.question.as_deref().map(str::trim).unwrap_or_default();
        let answer = self.answer.as_deref().map(str::trim).unwrap_or_default();
        if question.is_empty() || answer.is_empty() {
            return None;
        }
        Some(Flashcard::new(question, answer))
    }
}

/// Structured result of a `flashcard_generator` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Invoked tool name
    pub name: String,
    /// Raw elements, in the order produced
    pub flashcards: Vec<QuestionAnswer>,
    /// Topic when it was a string
    pub topic: Option<String>,
}

impl ToolInvocation {
    /// Read an invocation from its JSON input
    ///
    /// # Examples
    ///
    /// ```
    /// use flashtutor::tools::flashcard_generator::ToolInvocation;
    /// use serde_json::json;
    ///
    /// let invocation = ToolInvocation::from_input(&json!({
    ///     "flashcards": [{"question": "What is ATP?", "answer": "Energy currency"}],
    ///     "topic": "Cells"
    /// }));
    /// assert_eq!(invocation.valid_flashcards().len(), 1);
    /// assert_eq!(invocation.topic_or("Untitled Topic"), "Cells");
    /// ```
    pub fn from_input(input: &Value) -> Self {
        let field = |item: &Value, key: &str| item.get(key).and_then(Value::as_str).map(String::from);

        let flashcards = input
            .get("flashcards")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| QuestionAnswer {
                        question: field(item, "question"),
                        answer: field(item, "answer"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: NAME.to_string(),
            flashcards,
            topic: input.get("topic").and_then(Value::as_str).map(String::from),
        }
    }

    /// Valid elements mapped to `{term: question, definition: answer}`, in order
    pub fn valid_flashcards(&self) -> Vec<Flashcard> {
        self.flashcards
            .iter()
            .filter_map(QuestionAnswer::to_flashcard)
            .collect()
    }

    /// The trimmed topic, or `fallback` when absent or blank
    pub fn topic_or(&self, fallback: &str) -> String {
        match self.topic.as_deref().map(str::trim) {
            Some(topic) if !topic.is_empty() => topic.to_string(),
            _ => fallback.to_string(),
        }
    }
}
