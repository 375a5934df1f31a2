//! Command-line interface definition for Flashtutor
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the HTTP API, chatting from the terminal,
//! and browsing stored flashcards and conversations.

use clap::{Parser, Subcommand};

/// Flashtutor - chat with an AI tutor and collect flashcards
#[derive(Parser, Debug, Clone)]
#[command(name = "flashtutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the SQLite database path
    #[arg(long = "db", env = "FLASHTUTOR_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Flashtutor
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Socket address to bind (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Send a single prompt to the tutor and print the reply
    Chat {
        /// Conversation to continue; a new one is started when omitted
        #[arg(short = 'i', long)]
        conversation: Option<String>,

        /// Prompt text
        prompt: String,
    },

    /// Browse stored flashcard sets
    Flashcards {
        /// Flashcard subcommand
        #[command(subcommand)]
        command: FlashcardCommand,
    },

    /// Show the stored turns of a conversation
    History {
        /// Conversation identifier
        conversation: String,
    },
}

/// Flashcard browsing subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FlashcardCommand {
    /// List flashcard sets (id and topic only)
    List,

    /// Show every card of one set
    Show {
        /// Flashcard set identifier
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
