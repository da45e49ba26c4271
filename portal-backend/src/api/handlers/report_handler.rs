// src/api/handlers/report_handler.rs
use crate::api::dto::report_dto::{ReportListQuery, ReportResponse, UploadReportRequest};
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
use validator::Validate;

/// レポート登録（ファイル本体の保存は別経路）
pub async fn upload_report_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UploadReportRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    payload.validate()?;
    let report = app_state
        .report_service
        .upload(&user.principal, payload.into())
        .await?;
    Ok(ApiResponse::created(ReportResponse::from(report)))
}

pub async fn list_reports_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ReportListQuery>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let rows = app_state
        .report_service
        .list(&user.principal, query.report_type)
        .await?;
    Ok(ApiResponse::list(
        rows.into_iter()
            .map(|(report, _)| ReportResponse::from(report))
            .collect(),
    ))
}

pub async fn get_report_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = app_state.report_service.detail(&user.principal, id).await?;
    Ok(ApiResponse::success(ReportResponse::from(report)))
}

pub async fn review_report_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = app_state.report_service.review(&user.principal, id).await?;
    Ok(ApiResponse::success(ReportResponse::from(report)))
}

pub async fn approve_report_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = app_state.report_service.approve(&user.principal, id).await?;
    Ok(ApiResponse::success(ReportResponse::from(report)))
}

pub fn report_router(app_state: AppState) -> Router {
    Router::new()
        .route("/reports", post(upload_report_handler).get(list_reports_handler))
        .route("/reports/{id}", get(get_report_handler))
        .route("/reports/{id}/review", post(review_report_handler))
        .route("/reports/{id}/approve", post(approve_report_handler))
        .with_state(app_state)
}
