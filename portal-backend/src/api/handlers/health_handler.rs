// src/api/handlers/health_handler.rs
use crate::api::AppState;
use crate::types::ApiResponse;
use axum::{extract::State, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// ヘルスチェック（認証不要）
pub async fn health_handler(State(app_state): State<AppState>) -> ApiResponse<HealthResponse> {
    let db_healthy = match app_state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            false
        }
    };

    ApiResponse::success(HealthResponse {
        status: if db_healthy { "healthy" } else { "degraded" }.to_string(),
        database: if db_healthy {
            "connected"
        } else {
            "disconnected"
        }
        .to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

pub fn health_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(app_state)
}
