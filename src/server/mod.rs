//! HTTP API
//!
//! JSON routes over the extraction pipeline and the two stores. All shared
//! handles are built once at startup and carried in [`AppState`].

pub mod error;
pub mod handlers;

use crate::error::Result;
use crate::pipeline::ExtractionPipeline;
use crate::storage::{ConversationStore, FlashcardStore};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::info;

pub use error::ApiError;

/// Handles shared by every request
#[derive(Clone)]
pub struct AppState {
    /// Chat turn pipeline
    pub pipeline: Arc<ExtractionPipeline>,
    /// Flashcard set persistence
    pub flashcards: Arc<dyn FlashcardStore>,
    /// Conversation history persistence
    pub conversations: Arc<dyn ConversationStore>,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/flashcards",
            get(handlers::list_flashcards).post(handlers::create_flashcards),
        )
        .route("/flashcards/:id", get(handlers::get_flashcards))
        .route("/chat", post(handlers::chat))
        .route("/conversations/:id", get(handlers::conversation_history))
        .with_state(state)
}

/// Serve the API on `bind` until Ctrl-C
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server fails
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
