//! Chat assistant endpoint

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// POST /api/chat
///
/// Replies always use the `{reply}` shape, including failures.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> (StatusCode, Json<ChatReply>) {
    let Ok(Json(req)) = body else {
        return reply(StatusCode::BAD_REQUEST, "Please enter a message.");
    };
    let message = req.message.trim();
    if message.is_empty() {
        return reply(StatusCode::BAD_REQUEST, "Please enter a message.");
    }

    match state.assistant.reply(message).await {
        Ok(text) => reply(StatusCode::OK, text),
        Err(e) => {
            tracing::error!(error = %e, "Chat assistant failed");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error.")
        }
    }
}

fn reply(status: StatusCode, text: impl Into<String>) -> (StatusCode, Json<ChatReply>) {
    (status, Json(ChatReply { reply: text.into() }))
}
