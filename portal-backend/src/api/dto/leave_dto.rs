// src/api/dto/leave_dto.rs
use crate::domain::approval_record_model::{self, ApprovalAction};
use crate::domain::leave_application_model;
use crate::domain::leave_status::{ApprovalStage, LeaveStatus};
use crate::domain::visibility::OwnerContext;
use crate::service::leave_service::LeaveContent;
use crate::utils::validation::validate_not_blank;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const LOCATION_MAX_LENGTH: u64 = 200;
pub const REASON_MAX_LENGTH: u64 = 2000;
pub const COMMENT_MAX_LENGTH: u64 = 500;

// --- Request DTOs ---

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
pub struct LeaveContentDto {
    pub leave_start_date: NaiveDate,
    pub leave_end_date: NaiveDate,

    #[validate(
        length(
            min = 1,
            max = LOCATION_MAX_LENGTH,
            message = "Leave location must be between 1 and 200 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub leave_location: String,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within [-90, 90]"))]
    pub leave_latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be within [-180, 180]"
    ))]
    pub leave_longitude: Option<f64>,

    #[validate(
        length(
            min = 1,
            max = REASON_MAX_LENGTH,
            message = "Leave reason must be between 1 and 2000 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub leave_reason: String,
}

impl From<LeaveContentDto> for LeaveContent {
    fn from(dto: LeaveContentDto) -> Self {
        Self {
            leave_start_date: dto.leave_start_date,
            leave_end_date: dto.leave_end_date,
            leave_location: dto.leave_location,
            leave_latitude: dto.leave_latitude,
            leave_longitude: dto.leave_longitude,
            leave_reason: dto.leave_reason,
        }
    }
}

fn default_submit() -> bool {
    true
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct CreateLeaveRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub content: LeaveContentDto,

    /// false の場合は下書きのまま保存
    #[serde(default = "default_submit")]
    pub submit: bool,
}

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
pub struct ApproveLeaveRequest {
    #[validate(length(max = COMMENT_MAX_LENGTH, message = "Comment must not exceed 500 characters"))]
    pub comment: Option<String>,
}

/// 却下・取消の理由
#[derive(Deserialize, Serialize, Debug, Default, Validate)]
pub struct LeaveReasonRequest {
    #[validate(length(max = COMMENT_MAX_LENGTH, message = "Reason must not exceed 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LeaveListQuery {
    pub status: Option<LeaveStatus>,
}

// --- Response DTOs ---

#[derive(Serialize, Deserialize, Debug)]
pub struct LeaveApplicationResponse {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_task_area_id: Option<Uuid>,
    pub leave_start_date: NaiveDate,
    pub leave_end_date: NaiveDate,
    pub duration_days: i64,
    pub leave_location: String,
    pub leave_latitude: Option<f64>,
    pub leave_longitude: Option<f64>,
    pub leave_reason: String,
    pub status: LeaveStatus,
    pub current_approval_level: Option<ApprovalStage>,
    pub on_leave: bool,
    pub planned_leave: bool,
    pub task_area_manager_approved: bool,
    pub task_area_manager_approver_id: Option<Uuid>,
    pub head_manager_approved: bool,
    pub head_manager_approver_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveApplicationResponse {
    pub fn new(model: leave_application_model::Model, applicant: Option<&OwnerContext>) -> Self {
        Self::on(model, applicant, Utc::now().date_naive())
    }

    /// `today` を基準に休暇中・予定の判定を行う
    pub fn on(
        model: leave_application_model::Model,
        applicant: Option<&OwnerContext>,
        today: NaiveDate,
    ) -> Self {
        Self {
            duration_days: model.duration_days(),
            on_leave: model.is_on_leave(today),
            planned_leave: model.is_planned_leave(today),
            current_approval_level: model.current_approval_level(),
            applicant_task_area_id: applicant.and_then(|a| a.owner_task_area_id),
            id: model.id,
            applicant_id: model.applicant_id,
            leave_start_date: model.leave_start_date,
            leave_end_date: model.leave_end_date,
            leave_location: model.leave_location,
            leave_latitude: model.leave_latitude,
            leave_longitude: model.leave_longitude,
            leave_reason: model.leave_reason,
            status: model.status,
            task_area_manager_approved: model.task_area_manager_approved,
            task_area_manager_approver_id: model.task_area_manager_approver_id,
            head_manager_approved: model.head_manager_approved,
            head_manager_approver_id: model.head_manager_approver_id,
            rejection_reason: model.rejection_reason,
            cancellation_reason: model.cancellation_reason,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<leave_application_model::Model> for LeaveApplicationResponse {
    fn from(model: leave_application_model::Model) -> Self {
        Self::new(model, None)
    }
}

impl From<(leave_application_model::Model, OwnerContext)> for LeaveApplicationResponse {
    fn from((model, applicant): (leave_application_model::Model, OwnerContext)) -> Self {
        Self::new(model, Some(&applicant))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApprovalRecordResponse {
    pub id: Uuid,
    pub approver_id: Uuid,
    pub action: ApprovalAction,
    pub comment: Option<String>,
    pub approval_date: DateTime<Utc>,
}

impl From<approval_record_model::Model> for ApprovalRecordResponse {
    fn from(model: approval_record_model::Model) -> Self {
        Self {
            id: model.id,
            approver_id: model.approver_id,
            action: model.action,
            comment: model.comment,
            approval_date: model.approval_date,
        }
    }
}
