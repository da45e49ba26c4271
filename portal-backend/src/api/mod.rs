// src/api/mod.rs
use crate::logging::{inject_request_context, logging_middleware};
use crate::middleware::auth::{auth_middleware, AuthMiddlewareConfig};
use crate::repository::user_repository::UserRepository;
use crate::service::{
    alert_service::AlertService, leave_service::LeaveService, report_service::ReportService,
    user_service::UserService,
};
use axum::{middleware as axum_middleware, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod handlers;

/// 統一されたアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub leave_service: Arc<LeaveService>,
    pub report_service: Arc<ReportService>,
    pub alert_service: Arc<AlertService>,
    pub user_repository: Arc<UserRepository>,
    pub db: Arc<DatabaseConnection>,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        let db = Arc::new(db);
        Self {
            user_service: Arc::new(UserService::new(db.clone())),
            leave_service: Arc::new(LeaveService::new(db.clone())),
            report_service: Arc::new(ReportService::new(db.clone())),
            alert_service: Arc::new(AlertService::new(db.clone())),
            user_repository: Arc::new(UserRepository::new(db.clone())),
            db,
        }
    }
}

/// `/api` 以下の全ルートとミドルウェアを組み立てる
pub fn app_router(app_state: AppState) -> Router {
    let auth_config = AuthMiddlewareConfig::new(app_state.user_repository.clone());

    let api = Router::new()
        .merge(handlers::user_handler::user_router(app_state.clone()))
        .merge(handlers::leave_handler::leave_router(app_state.clone()))
        .merge(handlers::report_handler::report_router(app_state.clone()))
        .merge(handlers::alert_handler::alert_router(app_state.clone()))
        .layer(axum_middleware::from_fn_with_state(
            auth_config,
            auth_middleware,
        ));

    Router::new()
        .nest("/api", api)
        .merge(handlers::health_handler::health_router(app_state))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(axum_middleware::from_fn(inject_request_context))
        .layer(TraceLayer::new_for_http())
}
