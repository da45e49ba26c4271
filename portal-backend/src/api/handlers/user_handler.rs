// src/api/handlers/user_handler.rs
use crate::api::dto::user_dto::{
    AssignRoleRequest, CreateUserRequest, UpdateLocationRequest, UserDetailResponse, UserLocationResponse,
    UserResponse,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::extractors::ValidatedUuid;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, State},
    routing::{get, post, put},
    Router,
};
use tracing::info;
use validator::Validate;

/// 参照可能なユーザー一覧
pub async fn list_users_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = app_state.user_service.list_users(&user.principal).await?;
    Ok(ApiResponse::list(
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

/// ユーザー詳細
pub async fn get_user_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(user_id): ValidatedUuid,
) -> AppResult<ApiResponse<UserDetailResponse>> {
    let target = app_state
        .user_service
        .get_user(&user.principal, user_id)
        .await?;
    let managed_task_areas = if target.role.is_head_manager() {
        app_state.user_service.managed_task_areas(target.id).await?
    } else {
        Vec::new()
    };

    Ok(ApiResponse::success(UserDetailResponse {
        user: UserResponse::from(target),
        managed_task_areas,
    }))
}

/// ユーザー作成
pub async fn create_user_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<ApiResponse<UserDetailResponse>> {
    payload.validate()?;
    let (new_user, role, selection) = payload.into_parts();

    let created = app_state
        .user_service
        .create_user(&user.principal, new_user, role, selection)
        .await?;
    let managed_task_areas = app_state.user_service.managed_task_areas(created.id).await?;

    Ok(ApiResponse::created(UserDetailResponse {
        user: UserResponse::from(created),
        managed_task_areas,
    }))
}

/// ユーザーの無効化
pub async fn deactivate_user_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(user_id): ValidatedUuid,
) -> AppResult<ApiResponse<UserResponse>> {
    let deactivated = app_state
        .user_service
        .deactivate_user(&user.principal, user_id)
        .await?;
    Ok(ApiResponse::success(UserResponse::from(deactivated)))
}

/// ロールと任務区の割り当て
pub async fn assign_role_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(user_id): ValidatedUuid,
    Json(payload): Json<AssignRoleRequest>,
) -> AppResult<ApiResponse<UserDetailResponse>> {
    payload.validate()?;
    let (role, selection) = payload.into_parts();

    info!(
        actor_id = %user.user_id(),
        target_id = %user_id,
        role = %role,
        "Role assignment requested"
    );

    let updated = app_state
        .user_service
        .assign_role(&user.principal, user_id, role, selection)
        .await?;
    let managed_task_areas = app_state.user_service.managed_task_areas(updated.id).await?;

    Ok(ApiResponse::success(UserDetailResponse {
        user: UserResponse::from(updated),
        managed_task_areas,
    }))
}

/// 自分の位置情報を更新
pub async fn update_my_location_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateLocationRequest>,
) -> AppResult<ApiResponse<UserLocationResponse>> {
    payload.validate()?;
    let updated = app_state
        .user_service
        .update_location(
            &user.principal,
            payload.latitude,
            payload.longitude,
            payload.address,
        )
        .await?;
    Ok(ApiResponse::success(UserLocationResponse::from(updated)))
}

/// 参照可能なユーザーの最新位置
pub async fn list_locations_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<Vec<UserLocationResponse>>> {
    let users = app_state.user_service.locations(&user.principal).await?;
    Ok(ApiResponse::list(
        users.into_iter().map(UserLocationResponse::from).collect(),
    ))
}

pub fn user_router(app_state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route("/users/locations", get(list_locations_handler))
        .route("/users/me/location", put(update_my_location_handler))
        .route(
            "/users/{id}",
            get(get_user_handler).delete(deactivate_user_handler),
        )
        .route("/users/{id}/role", put(assign_role_handler))
        .with_state(app_state)
}
