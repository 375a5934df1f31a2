use crate::error::FlashtutorError;
use crate::pipeline::PipelineError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Error returned by HTTP handlers
///
/// Internal detail is logged when the response is built and never sent to
/// the client.
#[derive(Debug)]
pub enum ApiError {
    /// 400 `{error, field}`
    BadRequest {
        /// What is wrong
        error: String,
        /// Offending field, when one can be named
        field: Option<String>,
    },
    /// 404 `{error}`
    NotFound(String),
    /// Chat turn failure, mapped by kind
    Pipeline(PipelineError),
    /// 500 `{error}` with a generic message
    Internal(anyhow::Error),
}

impl ApiError {
    /// A 400 naming the offending field
    pub fn field(field: impl Into<String>, error: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            field: Some(field.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<FlashtutorError>() {
            Some(FlashtutorError::Validation { field, reason }) => {
                ApiError::field(field.clone(), reason.clone())
            }
            Some(FlashtutorError::NotFound(what)) => ApiError::NotFound(what.clone()),
            _ => ApiError::Internal(err),
        }
    }
}

impl From<FlashtutorError> for ApiError {
    fn from(err: FlashtutorError) -> Self {
        anyhow::Error::from(err).into()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::field("body", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest { error, field } => {
                let body = match field {
                    Some(field) => json!({ "error": error, "field": field }),
                    None => json!({ "error": error }),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{} not found", what) })),
            )
                .into_response(),
            ApiError::Pipeline(err) => {
                let message = err.user_message();
                match err {
                    PipelineError::Generation { .. } => {
                        (StatusCode::BAD_GATEWAY, Json(json!({ "message": message })))
                            .into_response()
                    }
                    PipelineError::Persistence { flashcards, .. } => {
                        let body = match flashcards {
                            Some(flashcards) => {
                                json!({ "message": message, "flashcards": flashcards })
                            }
                            None => json!({ "message": message }),
                        };
                        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
                    }
                }
            }
            ApiError::Internal(err) => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
