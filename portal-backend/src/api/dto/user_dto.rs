// src/api/dto/user_dto.rs
use crate::domain::area_assignment::{AreaChoice, AreaSelection};
use crate::domain::user_model;
use crate::domain::user_role::UserRole;
use crate::service::user_service::NewUser;
use crate::utils::validation::{validate_not_blank, validate_username};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const MANAGED_AREAS_MAX: u64 = 50;
pub const ADDRESS_MAX_LENGTH: u64 = 200;
pub const USERNAME_MIN_LENGTH: u64 = 3;
pub const USERNAME_MAX_LENGTH: u64 = 150;
pub const FULL_NAME_MAX_LENGTH: u64 = 100;

// --- Request DTOs ---

/// ロール割り当て
///
/// `task_area` は単一任務区のロール、`managed_task_areas` は総部責任者で使う。
/// 各要素は `{"existing": "<uuid>"}` または `{"new": "<name>"}`。
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct AssignRoleRequest {
    pub role: UserRole,

    #[serde(default)]
    pub task_area: Option<AreaChoice>,

    #[serde(default)]
    #[validate(length(
        max = MANAGED_AREAS_MAX,
        message = "At most 50 managed task areas can be assigned"
    ))]
    pub managed_task_areas: Vec<AreaChoice>,
}

impl AssignRoleRequest {
    pub fn into_parts(self) -> (UserRole, AreaSelection) {
        (
            self.role,
            AreaSelection {
                task_area: self.task_area,
                managed_task_areas: self.managed_task_areas,
            },
        )
    }
}

/// ユーザー作成（任務区の指定方法はロール割り当てと同じ）
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(
            min = USERNAME_MIN_LENGTH,
            max = USERNAME_MAX_LENGTH,
            message = "Username must be between 3 and 150 characters"
        ),
        custom(function = validate_username)
    )]
    pub username: String,

    #[validate(
        length(
            max = FULL_NAME_MAX_LENGTH,
            message = "Full name must not exceed 100 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub full_name: String,

    #[serde(flatten)]
    #[validate(nested)]
    pub assignment: AssignRoleRequest,
}

impl CreateUserRequest {
    pub fn into_parts(self) -> (NewUser, UserRole, AreaSelection) {
        let (role, selection) = self.assignment.into_parts();
        (
            NewUser {
                username: self.username,
                full_name: self.full_name,
            },
            role,
            selection,
        )
    }
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct UpdateLocationRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within [-90, 90]"))]
    pub latitude: f64,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be within [-180, 180]"
    ))]
    pub longitude: f64,

    #[validate(length(max = ADDRESS_MAX_LENGTH, message = "Address must not exceed 200 characters"))]
    pub address: Option<String>,
}

// --- Response DTOs ---

#[derive(Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub role_display_name: String,
    pub task_area_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user_model::Model> for UserResponse {
    fn from(model: user_model::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            full_name: model.full_name,
            role: model.role,
            role_display_name: model.role.display_name().to_string(),
            task_area_id: model.task_area_id,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub managed_task_areas: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserLocationResponse {
    pub user_id: Uuid,
    pub full_name: String,
    pub role: UserRole,
    pub task_area_id: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<user_model::Model> for UserLocationResponse {
    fn from(model: user_model::Model) -> Self {
        Self {
            user_id: model.id,
            full_name: model.full_name,
            role: model.role,
            task_area_id: model.task_area_id,
            latitude: model.latitude,
            longitude: model.longitude,
            address: model.location_address,
            updated_at: model.location_updated_at,
        }
    }
}
