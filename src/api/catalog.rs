// src/api/catalog.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::agent::{AgentError, ToolDefinition, Toolset};
use crate::blockchain::chains::all_chains;
use crate::blockchain::ChainEntry;
use crate::personality::{all_personalities, get_personality, Personality, PersonalitySummary};
use crate::AppState;

pub async fn list_chains_handler() -> Json<&'static [ChainEntry]> {
    Json(all_chains())
}

pub async fn list_personalities_handler() -> Json<Vec<PersonalitySummary<'static>>> {
    Json(all_personalities().into_iter().map(|p| p.summary()).collect())
}

/// Unknown ids resolve to the default personality.
pub async fn get_personality_handler(Path(id): Path<String>) -> Json<&'static Personality> {
    Json(get_personality(&id))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsResponse {
    pub chain_id: u64,
    pub agent_address: String,
    pub providers: Vec<&'static str>,
    pub tools: Vec<ToolDefinition>,
}

/// The tool set a chat on `chain_id` would be given.
pub async fn list_tools_handler(
    State(state): State<AppState>,
    Path(chain_id): Path<u64>,
) -> Result<Json<ToolsResponse>, (StatusCode, String)> {
    let toolset = Toolset::assemble(&state.config, chain_id, &state.contracts).map_err(|e| match e {
        AgentError::UnsupportedChain(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    })?;

    Ok(Json(ToolsResponse {
        chain_id,
        agent_address: toolset.wallet_address(),
        providers: toolset.provider_names(),
        tools: toolset.definitions(),
    }))
}
