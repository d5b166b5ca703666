// src/api/chat.rs

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::agent::{AgentError, Toolset};
use crate::auth::AuthSession;
use crate::blockchain::chains::is_supported;
use crate::chat::{build_system_prompt, spawn_chat, ChatLimits, DATA_STREAM_HEADER, DATA_STREAM_VERSION};
use crate::llm::ChatMessage;
use crate::personality::{get_personality, DEFAULT_PERSONALITY_ID};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub personality_id: Option<String>,
}

/// Failures before the response stream starts
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Unsupported chain ID: {0}")]
    UnsupportedChain(u64),
    #[error("Error processing request: {0}")]
    Processing(String),
}

impl From<AgentError> for ChatError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::UnsupportedChain(id) => ChatError::UnsupportedChain(id),
            other => ChatError::Processing(other.to_string()),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match self {
            ChatError::InvalidBody(_) | ChatError::UnsupportedChain(_) => StatusCode::BAD_REQUEST,
            ChatError::Processing(_) => {
                error!("Chat request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// Streams the assistant's reply in the data-stream line protocol.
pub async fn chat_handler(
    session: AuthSession,
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Response, ChatError> {
    let Json(body) = body.map_err(|e| ChatError::InvalidBody(e.body_text()))?;

    // 0 is treated like a missing id
    let chain_id = body
        .chain_id
        .filter(|id| *id != 0)
        .unwrap_or(state.config.default_chain_id);
    if !is_supported(chain_id) {
        warn!(chain_id, "Chat requested on unsupported chain");
        return Err(ChatError::UnsupportedChain(chain_id));
    }

    let toolset = Toolset::assemble(&state.config, chain_id, &state.contracts)?;
    let personality =
        get_personality(body.personality_id.as_deref().unwrap_or(DEFAULT_PERSONALITY_ID));
    let system = build_system_prompt(
        personality,
        toolset.chain(),
        &session.address,
        state.contracts.for_chain(chain_id).is_some(),
    );

    info!(
        user = %session.address,
        chain = toolset.chain().name,
        personality = %personality.id,
        messages = body.messages.len(),
        "Starting chat stream"
    );

    let limits = ChatLimits {
        max_steps: state.config.max_steps,
        max_duration: state.config.max_duration,
    };
    let events = spawn_chat(state.llm.clone(), toolset, system, body.messages, limits);
    let lines = events.map(|event| Ok::<_, std::convert::Infallible>(event.encode()));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(DATA_STREAM_HEADER, DATA_STREAM_VERSION)
        .body(Body::from_stream(lines))
        .map_err(|e| ChatError::Processing(e.to_string()))
}
