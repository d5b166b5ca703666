//! # API Module
//!
//! HTTP handlers for the chat backend. Everything is mounted under `/api`.
//!
//! ## Available Endpoints
//!
//! ### Chat
//! - `POST /chat` - Streamed agent conversation (requires a session token)
//!
//! ### Catalog
//! - `GET /chains` - Supported networks
//! - `GET /personalities` - Assistant personalities
//! - `GET /personalities/:id` - One personality including its system prompt
//! - `GET /tools/:chain_id` - Tools the agent gets on a chain
//!
//! ### Export
//! - `POST /export` - Records to CSV / JSON / PDF / XLSX
//! - `POST /export/portfolio-summary` - Portfolio summary file
//! - `POST /export/conversation` - Rows picked out of a chat's tool results

pub mod catalog;
pub mod chat;
pub mod export;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/chat", post(chat::chat_handler))
        .route("/chains", get(catalog::list_chains_handler))
        .route("/personalities", get(catalog::list_personalities_handler))
        .route("/personalities/:id", get(catalog::get_personality_handler))
        .route("/tools/:chain_id", get(catalog::list_tools_handler))
        .route("/export", post(export::export_handler))
        .route(
            "/export/portfolio-summary",
            post(export::portfolio_summary_handler),
        )
        .route(
            "/export/conversation",
            post(export::conversation_export_handler),
        )
}
