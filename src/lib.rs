//! Flashtutor - AI tutor chat that turns conversations into flashcards
//!
//! This library provides the core functionality for Flashtutor: a
//! tool-augmented tutor client, the conversation-to-flashcard extraction
//! pipeline, SQLite persistence, and the HTTP API over them.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `providers`: Model provider abstraction and the Anthropic implementation
//! - `tools`: The `flashcard_generator` tool schema and its input parsing
//! - `pipeline`: Tutor client and the extraction pipeline
//! - `storage`: Flashcard and conversation stores
//! - `server`: axum router and handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use flashtutor::commands::build_state;
//! use flashtutor::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let state = build_state(&config)?;
//!     let reply = state
//!         .pipeline
//!         .handle_turn("conversation-1", "Make flashcards on mitosis")
//!         .await?;
//!     println!("{}", reply.message);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod storage;
pub mod tools;

// Re-export commonly used types
pub use config::Config;
pub use error::{FlashtutorError, Result};
pub use pipeline::{ExtractionPipeline, PipelineError, TurnReply};

#[cfg(test)]
pub mod test_utils;
