use crate::error::FlashtutorError;
use crate::providers::{Message, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One term/definition pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Front of the card
    pub term: String,
    /// Back of the card
    pub definition: String,
}

impl Flashcard {
    /// Create a card from its two faces
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }

    /// Check that both faces carry text
    ///
    /// `index` is used to name the offending field in the error.
    pub fn validate(&self, index: usize) -> Result<(), FlashtutorError> {
        if self.term.trim().is_empty() {
            return Err(FlashtutorError::validation(
                format!("flashcards[{}].term", index),
                "must not be empty",
            ));
        }
        if self.definition.trim().is_empty() {
            return Err(FlashtutorError::validation(
                format!("flashcards[{}].definition", index),
                "must not be empty",
            ));
        }
        Ok(())
    }
}

/// A topic-labelled, ordered collection of flashcards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    /// Unique identifier
    pub id: String,
    /// Topic label
    pub topic: String,
    /// Cards in their original order
    pub flashcards: Vec<Flashcard>,
    /// When the set was stored
    pub created_at: DateTime<Utc>,
}

/// Listing projection of a [`FlashcardSet`]; never carries card bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSetSummary {
    /// Unique identifier
    pub id: String,
    /// Topic label
    pub topic: String,
}

impl From<&FlashcardSet> for FlashcardSetSummary {
    fn from(set: &FlashcardSet) -> Self {
        Self {
            id: set.id.clone(),
            topic: set.topic.clone(),
        }
    }
}

/// One message in a conversation's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    /// Conversation this turn belongs to
    pub conversation_id: String,
    /// Author
    pub role: Role,
    /// Message text
    pub content: String,
    /// When the turn happened
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the given instant
    pub fn new(
        conversation_id: impl Into<String>,
        role: Role,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// The turn as a provider message
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}
