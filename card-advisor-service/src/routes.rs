use axum::{
    Json,
    extract::{Path, State},
};
use card_flow::{Card, FlowReply, Question, Session};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

/// Exactly one of the two fields is set; both are always present in the JSON.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: Option<String>,
    pub recommendations: Option<Vec<Card>>,
}

impl From<FlowReply> for ChatResponse {
    fn from(reply: FlowReply) -> Self {
        match reply {
            FlowReply::Reply(text) => ChatResponse {
                reply: Some(text),
                recommendations: None,
            },
            FlowReply::Recommendations(cards) => ChatResponse {
                reply: None,
                recommendations: Some(cards),
            },
        }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    // Any string is a session key, the blank one included.
    info!(
        session_id = %request.session_id,
        message_length = request.message.len(),
        "Processing chat message"
    );

    let reply = state
        .runner
        .handle(&request.session_id, &request.message)
        .await?;

    Ok(Json(reply.into()))
}

pub async fn list_questions(State(state): State<AppState>) -> Json<&'static [Question]> {
    Json(state.runner.controller().questions())
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    match state.runner.session(&session_id).await? {
        Some(session) => Ok(Json(session)),
        None => Err(ApiError::NotFound(format!("Session not found: {session_id}"))),
    }
}
