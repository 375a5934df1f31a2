/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `serve`: Run the HTTP API
- `chat`: Send one prompt through the extraction pipeline
- `flashcards`: Browse stored flashcard sets
- `history`: Print a conversation's turns

`serve` and `chat` talk to the model and refuse to start without a
credential; the browsing commands only open the database.
*/

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{ExtractionPipeline, Tutor};
use crate::providers::create_provider;
use crate::server::AppState;
use crate::storage::SqliteStorage;
use std::sync::Arc;
use std::time::Duration;

pub mod flashcards;
pub mod history;

/// Build every shared handle from configuration
///
/// # Errors
///
/// Returns `FlashtutorError::MissingCredentials` when no API key is set,
/// before the database is touched.
pub fn build_state(config: &Config) -> Result<AppState> {
    let provider = create_provider(&config.provider)?;
    let storage = Arc::new(SqliteStorage::new(&config.storage)?);
    tracing::debug!("Opened storage at {}", storage.db_path().display());

    let tutor = Tutor::new(
        provider,
        Duration::from_secs(config.provider.anthropic.timeout_seconds),
    )
    .with_system_prompt(config.pipeline.system_prompt.clone());
    let pipeline = ExtractionPipeline::new(
        tutor,
        storage.clone(),
        storage.clone(),
        &config.pipeline,
    );

    Ok(AppState {
        pipeline: Arc::new(pipeline),
        flashcards: storage.clone(),
        conversations: storage,
    })
}

// Serve command handler
pub mod serve {
    //! Runs the HTTP API until interrupted.

    use super::*;

    /// Start the server on the configured bind address
    ///
    /// # Errors
    ///
    /// Returns error if credentials are missing, storage cannot be opened,
    /// or the address cannot be bound
    pub async fn run_serve(config: Config) -> Result<()> {
        let state = build_state(&config)?;
        tracing::info!(
            model = %config.provider.anthropic.model,
            trigger = %config.pipeline.trigger,
            "Starting flashtutor server"
        );
        crate::server::serve(&config.server.bind, state).await
    }
}

// Chat command handler
pub mod chat {
    //! Single-shot chat from the terminal.
    //!
    //! Sends one prompt through the same pipeline the HTTP API uses, so
    //! history and flashcards land in the same database.

    use super::*;
    use colored::Colorize;

    /// Send `prompt` to the tutor
    ///
    /// A new conversation id is generated when none is given and printed so
    /// the conversation can be continued with `--conversation`.
    ///
    /// # Errors
    ///
    /// Returns error if the state cannot be built, or the user-facing
    /// message alone if the turn fails
    pub async fn run_chat(config: Config, conversation: Option<String>, prompt: String) -> Result<()> {
        let state = build_state(&config)?;
        let conversation_id = conversation.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        match state.pipeline.handle_turn(&conversation_id, &prompt).await {
            Ok(reply) => {
                println!("{}", reply.message);
                if let Some(cards) = &reply.flashcards {
                    println!();
                    for card in cards {
                        println!("  {} {}", card.term.bold(), card.definition.dimmed());
                    }
                }
                println!();
                println!("{} {}", "Conversation:".dimmed(), conversation_id.cyan());
                Ok(())
            }
            // Detail is already logged by the pipeline.
            Err(err) => Err(anyhow::anyhow!(err.user_message())),
        }
    }
}
