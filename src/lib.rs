// src/lib.rs

use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod agent;
pub mod api;
pub mod auth;
pub mod blockchain;
pub mod chat;
pub mod config;
pub mod export;
pub mod llm;
pub mod personality;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Streaming chat model the agent loop talks to
    pub llm: Arc<dyn llm::ChatModel>,
    /// Deployed contracts per chain, loaded once at startup
    pub contracts: blockchain::ContractRegistry,
    /// Verifies session tokens from the sign-in flow
    pub sessions: auth::SessionSigner,
}

impl AppState {
    pub fn new(
        config: config::Config,
        llm: Arc<dyn llm::ChatModel>,
        contracts: blockchain::ContractRegistry,
    ) -> Self {
        let sessions = auth::SessionSigner::new(&config.session_secret);
        Self {
            config,
            llm,
            contracts,
            sessions,
        }
    }
}

/// Full application router with the API mounted under `/api`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::create_api_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
