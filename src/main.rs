// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web3_chat_server::{
    blockchain::ContractRegistry, config::Config, create_router, llm::OpenAiModel, AppState,
};

async fn run_http_server(state: AppState) {
    let port = state.config.port;
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Failed to bind {}: {}", addr, e);
            return;
        }
    };
    info!("🚀 HTTP Server listening on {}", addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!("❌ Server error: {}", e);
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web3_chat_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            return;
        }
    };

    let contracts = match &config.contracts_path {
        Some(path) => match ContractRegistry::load(path) {
            Ok(registry) => registry,
            Err(e) => {
                error!("❌ Failed to load contracts from {}: {:#}", path, e);
                return;
            }
        },
        None => {
            warn!("CONTRACTS_PATH not set, contract tools will report no deployments");
            ContractRegistry::empty()
        }
    };

    let llm = Arc::new(OpenAiModel::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
    ));
    info!(model = %config.openai_model, "Chat model configured");

    run_http_server(AppState::new(config, llm, contracts)).await;
}
