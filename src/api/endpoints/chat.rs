//! Conversational intake endpoints.
//!
//! Three endpoints:
//! - `POST /api/chat/start` — open a session, returns id + opening replies
//! - `POST /api/chat/:id/message` — process one utterance
//! - `POST /api/chat/:id/restart` — discard the session, start fresh

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::registry::lock_session;
use crate::api::types::ApiContext;
use crate::dialogue::types::{Reply, TurnOutcome};

const MAX_MESSAGE_CHARS: usize = 2_000;

#[derive(Serialize)]
pub struct StartResponse {
    pub session_id: Uuid,
    pub replies: Vec<Reply>,
}

/// `POST /api/chat/start` — open a new intake conversation.
pub async fn start(State(ctx): State<ApiContext>) -> Json<StartResponse> {
    let (session_id, replies) = ctx.sessions.create();
    Json(StartResponse {
        session_id,
        replies,
    })
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct TurnResponse {
    /// Conversation phase after the turn, for renderers that gate input.
    pub step: &'static str,
    #[serde(flatten)]
    pub outcome: TurnOutcome,
}

/// `POST /api/chat/:id/message` — process one user utterance.
pub async fn message(
    State(ctx): State<ApiContext>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }
    if req.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message too long (max {MAX_MESSAGE_CHARS} chars)"
        )));
    }

    let entry = ctx
        .sessions
        .get(session_id)
        .ok_or(ApiError::SessionNotFound(session_id))?;
    // One synchronous turn per lock; utterances for a session serialise here.
    let (step, outcome) = {
        let mut controller = lock_session(&entry);
        let outcome = controller.handle_turn(&req.message);
        (controller.state().step().as_str(), outcome)
    };

    Ok(Json(TurnResponse { step, outcome }))
}

/// `POST /api/chat/:id/restart` — atomically replace the session.
pub async fn restart(
    State(ctx): State<ApiContext>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StartResponse>, ApiError> {
    let replies = ctx
        .sessions
        .restart(session_id)
        .ok_or(ApiError::SessionNotFound(session_id))?;
    Ok(Json(StartResponse {
        session_id,
        replies,
    }))
}
