// src/api/handlers/leave_handler.rs
use crate::api::dto::leave_dto::{
    ApprovalRecordResponse, ApproveLeaveRequest, CreateLeaveRequest, LeaveApplicationResponse,
    LeaveContentDto, LeaveListQuery, LeaveReasonRequest,
};
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

/// 休暇申請（既定で提出まで行う）
pub async fn create_leave_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateLeaveRequest>,
) -> AppResult<ApiResponse<LeaveApplicationResponse>> {
    payload.validate()?;
    let created = app_state
        .leave_service
        .create(&user.principal, payload.content.into(), payload.submit)
        .await?;
    Ok(ApiResponse::created(LeaveApplicationResponse::from(created)))
}

/// 下書きの編集
pub async fn update_leave_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<LeaveContentDto>,
) -> AppResult<ApiResponse<LeaveApplicationResponse>> {
    payload.validate()?;
    let updated = app_state
        .leave_service
        .update_draft(&user.principal, id, payload.into())
        .await?;
    Ok(ApiResponse::success(LeaveApplicationResponse::from(updated)))
}

pub async fn submit_leave_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<LeaveApplicationResponse>> {
    let submitted = app_state.leave_service.submit(&user.principal, id).await?;
    Ok(ApiResponse::success(LeaveApplicationResponse::from(submitted)))
}

pub async fn list_leaves_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<LeaveListQuery>,
) -> AppResult<ApiResponse<Vec<LeaveApplicationResponse>>> {
    let rows = app_state
        .leave_service
        .list(&user.principal, query.status)
        .await?;
    Ok(ApiResponse::list(
        rows.into_iter().map(LeaveApplicationResponse::from).collect(),
    ))
}

/// 自分が今承認できる申請
pub async fn pending_leaves_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<Vec<LeaveApplicationResponse>>> {
    let rows = app_state.leave_service.pending_for(&user.principal).await?;
    Ok(ApiResponse::list(
        rows.into_iter().map(LeaveApplicationResponse::from).collect(),
    ))
}

pub async fn get_leave_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<LeaveApplicationResponse>> {
    let row = app_state.leave_service.get(&user.principal, id).await?;
    Ok(ApiResponse::success(LeaveApplicationResponse::from(row)))
}

pub async fn leave_history_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<Vec<ApprovalRecordResponse>>> {
    let records = app_state.leave_service.history(&user.principal, id).await?;
    Ok(ApiResponse::list(
        records
            .into_iter()
            .map(ApprovalRecordResponse::from)
            .collect(),
    ))
}

pub async fn approve_leave_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<ApproveLeaveRequest>,
) -> AppResult<ApiResponse<LeaveApplicationResponse>> {
    payload.validate()?;
    let approved = app_state
        .leave_service
        .approve(&user.principal, id, payload.comment)
        .await?;
    Ok(ApiResponse::success(LeaveApplicationResponse::from(approved)))
}

pub async fn reject_leave_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<LeaveReasonRequest>,
) -> AppResult<ApiResponse<LeaveApplicationResponse>> {
    payload.validate()?;
    let rejected = app_state
        .leave_service
        .reject(&user.principal, id, payload.reason)
        .await?;
    Ok(ApiResponse::success(LeaveApplicationResponse::from(rejected)))
}

pub async fn cancel_leave_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<LeaveReasonRequest>,
) -> AppResult<ApiResponse<LeaveApplicationResponse>> {
    payload.validate()?;
    let cancelled = app_state
        .leave_service
        .cancel(&user.principal, id, payload.reason)
        .await?;
    Ok(ApiResponse::success(LeaveApplicationResponse::from(cancelled)))
}

pub fn leave_router(app_state: AppState) -> Router {
    Router::new()
        .route("/leaves", post(create_leave_handler).get(list_leaves_handler))
        .route("/leaves/pending", get(pending_leaves_handler))
        .route("/leaves/{id}", get(get_leave_handler).put(update_leave_handler))
        .route("/leaves/{id}/submit", post(submit_leave_handler))
        .route("/leaves/{id}/history", get(leave_history_handler))
        .route("/leaves/{id}/approve", post(approve_leave_handler))
        .route("/leaves/{id}/reject", post(reject_leave_handler))
        .route("/leaves/{id}/cancel", post(cancel_leave_handler))
        .with_state(app_state)
}
