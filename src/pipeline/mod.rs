//! Conversation-to-flashcard extraction pipeline
//!
//! One chat turn flows through: history read, tutor call, response
//! classification, flashcard write, turn append. The [`ExtractionPipeline`]
//! owns that sequence; the [`Tutor`] owns the model call.

pub mod extraction;
pub mod trigger;
pub mod tutor;

pub use extraction::{ExtractionPipeline, TurnReply};
pub use trigger::FlashcardTrigger;
pub use tutor::{Tutor, TutorReply};

use crate::storage::Flashcard;
use std::fmt;
use thiserror::Error;

/// Reply when flashcards were generated and stored
pub const CONFIRMATION_MESSAGE: &str =
    "Flashcards generated successfully! Refresh the page to view them and click on flashcards to flip them.";

/// Reply when the model invoked the tool without a single usable pair
pub const NO_FLASHCARDS_MESSAGE: &str =
    "No flashcards were generated. Try asking something else!";

/// Reply when the model produced no usable text
pub const NO_TEXT_MESSAGE: &str = "Unable to process the response.";

/// Reply when the model call or the history read failed
pub const GENERATION_FAILURE_MESSAGE: &str = "Sorry, something went wrong!";

/// Reply when the flashcard set could not be stored
pub const FLASHCARDS_NOT_SAVED_MESSAGE: &str =
    "Your flashcards were generated but could not be saved. Please try again.";

/// Reply when the conversation turns could not be stored
pub const TURNS_NOT_SAVED_MESSAGE: &str = "Your reply was generated but could not be saved.";

/// Which write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStage {
    /// Storing the flashcard set
    Flashcards,
    /// Appending conversation turns
    Turns,
}

impl fmt::Display for PersistenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceStage::Flashcards => f.write_str("flashcard set"),
            PersistenceStage::Turns => f.write_str("conversation turns"),
        }
    }
}

/// Failure of one pipeline turn
///
/// `detail` is for logs only; callers show [`PipelineError::user_message`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// History read or model call failed; nothing was written
    #[error("Generation failed: {detail}")]
    Generation {
        /// Internal cause
        detail: String,
    },

    /// The model answered but a write failed
    #[error("Persisting {stage} failed: {detail}")]
    Persistence {
        /// Write that failed
        stage: PersistenceStage,
        /// Flashcards that were stored before the failure, if any
        flashcards: Option<Vec<Flashcard>>,
        /// Internal cause
        detail: String,
    },
}

impl PipelineError {
    /// Fixed text safe to show the user
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Generation { .. } => GENERATION_FAILURE_MESSAGE,
            PipelineError::Persistence {
                stage: PersistenceStage::Flashcards,
                ..
            } => FLASHCARDS_NOT_SAVED_MESSAGE,
            PipelineError::Persistence {
                stage: PersistenceStage::Turns,
                ..
            } => TURNS_NOT_SAVED_MESSAGE,
        }
    }
}
