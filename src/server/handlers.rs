use super::error::ApiError;
use super::AppState;
use crate::storage::{ConversationTurn, Flashcard, FlashcardSet, FlashcardSetSummary};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Topic used by `POST /flashcards` when the body carries none
pub const DEFAULT_UPLOAD_TOPIC: &str = "Generated Flashcards";

const CREATED_MESSAGE: &str = "Flashcard set created successfully!";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlashcardsRequest {
    pub flashcards: Vec<Flashcard>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateFlashcardsResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSetList {
    pub flashcard_sets: Vec<FlashcardSetSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSetEnvelope {
    pub flashcard_set: FlashcardSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub prompt: String,
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationHistory {
    pub turns: Vec<ConversationTurn>,
}

pub async fn health() -> &'static str {
    "OK"
}

/// `POST /flashcards`
pub async fn create_flashcards(
    State(state): State<AppState>,
    payload: Result<Json<CreateFlashcardsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateFlashcardsResponse>), ApiError> {
    let Json(request) = payload?;

    if request.flashcards.is_empty() {
        return Err(ApiError::field(
            "flashcards",
            "must contain at least one flashcard",
        ));
    }
    for (index, card) in request.flashcards.iter().enumerate() {
        card.validate(index)?;
    }

    let topic = match request.topic.as_deref().map(str::trim) {
        Some(topic) if !topic.is_empty() => topic.to_string(),
        _ => DEFAULT_UPLOAD_TOPIC.to_string(),
    };
    let flashcards: Vec<Flashcard> = request
        .flashcards
        .iter()
        .map(|card| Flashcard::new(card.term.trim(), card.definition.trim()))
        .collect();

    let id = state.flashcards.create(&topic, &flashcards).await?;
    info!(set_id = %id, count = flashcards.len(), "Created flashcard set via API");

    Ok((
        StatusCode::CREATED,
        Json(CreateFlashcardsResponse {
            message: CREATED_MESSAGE.to_string(),
            id,
        }),
    ))
}

/// `GET /flashcards`
pub async fn list_flashcards(
    State(state): State<AppState>,
) -> Result<Json<FlashcardSetList>, ApiError> {
    let flashcard_sets = state.flashcards.list_summaries().await?;
    Ok(Json(FlashcardSetList { flashcard_sets }))
}

/// `GET /flashcards/:id`
pub async fn get_flashcards(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FlashcardSetEnvelope>, ApiError> {
    match state.flashcards.get(&id).await? {
        Some(flashcard_set) => Ok(Json(FlashcardSetEnvelope { flashcard_set })),
        None => Err(ApiError::NotFound(format!("Flashcard set {}", id))),
    }
}

/// `POST /chat`
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<crate::pipeline::TurnReply>, ApiError> {
    let Json(request) = payload?;

    if request.prompt.trim().is_empty() {
        return Err(ApiError::field("prompt", "must not be empty"));
    }
    let conversation_id = request.conversation_id.trim();
    if conversation_id.is_empty() {
        return Err(ApiError::field("conversationId", "must not be empty"));
    }

    let reply = state
        .pipeline
        .handle_turn(conversation_id, &request.prompt)
        .await?;
    Ok(Json(reply))
}

/// `GET /conversations/:id`
pub async fn conversation_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationHistory>, ApiError> {
    let turns = state.conversations.list_by_conversation(&id).await?;
    Ok(Json(ConversationHistory { turns }))
}
