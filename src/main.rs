//! Flashtutor - AI tutor chat that turns conversations into flashcards
//!
#![doc = "Main entry point for the Flashtutor service and CLI."]

use anyhow::Result;

use flashtutor::cli::{Cli, Commands};
use flashtutor::commands;
use flashtutor::config::Config;
use flashtutor::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Initialize logging from the loaded configuration
    logging::init_logging(&config.logging)?;
    tracing::debug!("Loaded configuration from {}", config_path);

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting server mode");
            commands::serve::run_serve(config).await?;
            Ok(())
        }
        Commands::Chat {
            conversation,
            prompt,
        } => {
            if let Some(id) = &conversation {
                tracing::debug!("Continuing conversation: {}", id);
            }
            commands::chat::run_chat(config, conversation, prompt).await?;
            Ok(())
        }
        Commands::Flashcards { command } => {
            commands::flashcards::handle_flashcards(&config, command).await?;
            Ok(())
        }
        Commands::History { conversation } => {
            commands::history::handle_history(&config, &conversation).await?;
            Ok(())
        }
    }
}
