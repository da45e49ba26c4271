// src/api/handlers/alert_handler.rs
use crate::api::dto::alert_dto::{AlertListQuery, AlertResponse, CreateAlertRequest};
use crate::api::AppState;
use crate::error::AppResult;
use crate::extractors::ValidatedUuid;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Query, State},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use validator::Validate;

/// 緊急アラート発報
pub async fn create_alert_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateAlertRequest>,
) -> AppResult<ApiResponse<AlertResponse>> {
    payload.validate()?;
    let alert = app_state
        .alert_service
        .create(&user.principal, payload.into())
        .await?;
    Ok(ApiResponse::created(AlertResponse::from(alert)))
}

pub async fn list_alerts_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<AlertListQuery>,
) -> AppResult<ApiResponse<Vec<AlertResponse>>> {
    let rows = app_state
        .alert_service
        .list(&user.principal, query.status)
        .await?;
    let now = Utc::now();
    Ok(ApiResponse::list(
        rows.into_iter()
            .map(|(alert, _)| AlertResponse::at(alert, now))
            .collect(),
    ))
}

pub async fn get_alert_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<AlertResponse>> {
    let alert = app_state.alert_service.get(&user.principal, id).await?;
    Ok(ApiResponse::success(AlertResponse::from(alert)))
}

pub async fn handle_alert_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<AlertResponse>> {
    let alert = app_state.alert_service.handle(&user.principal, id).await?;
    Ok(ApiResponse::success(AlertResponse::from(alert)))
}

pub async fn resolve_alert_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<AlertResponse>> {
    let alert = app_state.alert_service.resolve(&user.principal, id).await?;
    Ok(ApiResponse::success(AlertResponse::from(alert)))
}

pub async fn cancel_alert_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<AlertResponse>> {
    let alert = app_state.alert_service.cancel(&user.principal, id).await?;
    Ok(ApiResponse::success(AlertResponse::from(alert)))
}

pub fn alert_router(app_state: AppState) -> Router {
    Router::new()
        .route("/alerts", post(create_alert_handler).get(list_alerts_handler))
        .route("/alerts/{id}", get(get_alert_handler))
        .route("/alerts/{id}/handle", post(handle_alert_handler))
        .route("/alerts/{id}/resolve", post(resolve_alert_handler))
        .route("/alerts/{id}/cancel", post(cancel_alert_handler))
        .with_state(app_state)
}
