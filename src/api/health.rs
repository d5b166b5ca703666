use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::agent::providers::NoditProvider;
use crate::AppState;

/// Liveness plus the reachability of the Nodit API when a key is configured.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let nodit = match &state.config.nodit_api_key {
        Some(key) => {
            let provider = NoditProvider::new(key.clone(), state.config.nodit_base_url.clone());
            let outcome = provider.test_connection().await;
            json!({
                "configured": true,
                "reachable": outcome.success,
                "detail": outcome.message.or(outcome.error),
            })
        }
        None => json!({"configured": false}),
    };

    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "nodit": nodit,
    }))
}
