//! services/api/src/web/chat.rs
//!
//! Axum handlers for the chat transcript: read it, send a question, clear it.

use crate::web::rest::{MessageDto, SendMessageRequest, SendMessageResponse, TranscriptResponse};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use support_chat_core::{RejectReason, SubmitOutcome};
use tracing::error;

/// Return the transcript in display order.
#[utoipa::path(
    get,
    path = "/messages",
    responses(
        (status = 200, description = "Current transcript", body = TranscriptResponse)
    )
)]
pub async fn get_messages_handler(State(app_state): State<Arc<AppState>>) -> Json<TranscriptResponse> {
    let messages = app_state.conversation.messages().await;
    let sending = app_state.conversation.is_sending().await;
    Json(TranscriptResponse::new(&messages, sending))
}

/// Ask the assistant a question.
///
/// The request waits until the completion service replies. A failed completion
/// still returns 200 with the fallback apology as the reply.
#[utoipa::path(
    post,
    path = "/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Reply appended to the transcript", body = SendMessageResponse),
        (status = 400, description = "The message was blank"),
        (status = 409, description = "A previous question is still being answered")
    )
)]
pub async fn send_message_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, (StatusCode, String)> {
    match app_state.conversation.submit(&payload.content).await {
        SubmitOutcome::Answered(reply) => Ok(Json(SendMessageResponse {
            outcome: "answered".to_string(),
            reply: MessageDto::from(&reply),
        })),
        SubmitOutcome::Fallback(reply) => Ok(Json(SendMessageResponse {
            outcome: "fallback".to_string(),
            reply: MessageDto::from(&reply),
        })),
        SubmitOutcome::Rejected(RejectReason::EmptyInput) => Err((
            StatusCode::BAD_REQUEST,
            "Message must not be empty".to_string(),
        )),
        SubmitOutcome::Rejected(RejectReason::Busy) => Err((
            StatusCode::CONFLICT,
            "Still answering the previous question".to_string(),
        )),
    }
}

/// Reset the transcript to a single greeting.
#[utoipa::path(
    delete,
    path = "/messages",
    responses(
        (status = 200, description = "Transcript cleared", body = TranscriptResponse),
        (status = 500, description = "The cleared transcript could not be saved")
    )
)]
pub async fn clear_chat_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<TranscriptResponse>, (StatusCode, String)> {
    let messages = app_state.conversation.clear_chat().await.map_err(|e| {
        error!("Failed to clear chat: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to clear chat".to_string(),
        )
    })?;
    let sending = app_state.conversation.is_sending().await;
    Ok(Json(TranscriptResponse::new(&messages, sending)))
}
