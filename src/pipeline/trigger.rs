use crate::error::FlashtutorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// When the `flashcard_generator` tool is offered to the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashcardTrigger {
    /// Offer the tool only when the prompt mentions flashcards
    #[default]
    Keyword,
    /// Offer the tool on every call and let the model decide
    Always,
}

const KEYWORDS: [&str; 2] = ["flashcard", "flash card"];

impl FlashcardTrigger {
    /// Decide whether this prompt should be offered the tool
    ///
    /// # Examples
    ///
    /// ```
    /// use flashtutor::pipeline::FlashcardTrigger;
    ///
    /// assert!(FlashcardTrigger::Keyword.wants_flashcards("Make FlashCards on mitosis"));
    /// assert!(!FlashcardTrigger::Keyword.wants_flashcards("Explain mitosis"));
    /// assert!(FlashcardTrigger::Always.wants_flashcards("Explain mitosis"));
    /// ```
    pub fn wants_flashcards(&self, prompt: &str) -> bool {
        match self {
            FlashcardTrigger::Always => true,
            FlashcardTrigger::Keyword => {
                let lowered = prompt.to_lowercase();
                KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
            }
        }
    }

    /// Configuration name of the trigger
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashcardTrigger::Keyword => "keyword",
            FlashcardTrigger::Always => "always",
        }
    }
}

impl fmt::Display for FlashcardTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlashcardTrigger {
    type Err = FlashtutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(FlashcardTrigger::Keyword),
            "always" => Ok(FlashcardTrigger::Always),
            other => Err(FlashtutorError::Config(format!(
                "Unknown flashcard trigger: {} (expected keyword or always)",
                other
            ))),
        }
    }
}
