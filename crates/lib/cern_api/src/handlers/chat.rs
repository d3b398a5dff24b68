// @awa-component: CHAT-ChatHandler
//
//! Chat request handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{ChatRequest, ChatResponse};

/// `POST /api/chat` — record one turn and return the assistant reply.
///
/// Bodies that do not match [`ChatRequest`], blank prompts and text containing
/// NUL (which PostgreSQL `TEXT` cannot hold) are rejected with 400 before
/// anything is stored.
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    if req.user_prompt.trim().is_empty() {
        return Err(AppError::Validation("userPrompt must not be empty".into()));
    }
    if req.user_prompt.contains('\0') {
        return Err(AppError::Validation("userPrompt must not contain NUL characters".into()));
    }
    if req.session_id.as_deref().is_some_and(|id| id.contains('\0')) {
        return Err(AppError::Validation("sessionId must not contain NUL characters".into()));
    }

    debug!(
        has_session = req.session_id.is_some(),
        prompt_len = req.user_prompt.len(),
        "chat turn received"
    );

    let outcome = state
        .service
        .handle_turn(req.session_id.as_deref(), &req.user_prompt)
        .await?;

    Ok(Json(ChatResponse {
        cern_response: outcome.reply,
        thought_process: outcome.explanation,
        session_id: outcome.session_id,
    }))
}
