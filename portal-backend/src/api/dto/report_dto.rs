// src/api/dto/report_dto.rs
use crate::domain::report_model::{self, ReportStatus, ReportType};
use crate::service::report_service::ReportUpload;
use crate::utils::validation::validate_not_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const TITLE_MAX_LENGTH: u64 = 200;
pub const PERIOD_MAX_LENGTH: u64 = 50;
pub const FILE_NAME_MAX_LENGTH: u64 = 255;
pub const DESCRIPTION_MAX_LENGTH: u64 = 2000;

// --- Request DTOs ---

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct UploadReportRequest {
    #[validate(
        length(
            min = 1,
            max = TITLE_MAX_LENGTH,
            message = "Report title must be between 1 and 200 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub title: String,

    pub report_type: ReportType,

    /// 週次は `YYYY-Wnn`、月次は `YYYY-Mnn`
    #[validate(length(
        min = 1,
        max = PERIOD_MAX_LENGTH,
        message = "Report period must be between 1 and 50 characters"
    ))]
    pub report_period: String,

    #[validate(
        length(
            min = 1,
            max = FILE_NAME_MAX_LENGTH,
            message = "File name must be between 1 and 255 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub file_name: String,

    #[validate(length(
        max = DESCRIPTION_MAX_LENGTH,
        message = "Description must not exceed 2000 characters"
    ))]
    pub description: Option<String>,
}

impl From<UploadReportRequest> for ReportUpload {
    fn from(request: UploadReportRequest) -> Self {
        Self {
            title: request.title,
            report_type: request.report_type,
            report_period: request.report_period,
            file_name: request.file_name,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ReportListQuery {
    pub report_type: Option<ReportType>,
}

// --- Response DTOs ---

#[derive(Serialize, Deserialize, Debug)]
pub struct ReportResponse {
    pub id: Uuid,
    pub title: String,
    pub report_type: ReportType,
    pub report_period: String,
    pub uploader_id: Uuid,
    pub task_area_id: Uuid,
    pub file_name: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub is_viewed: bool,
    pub viewed_by: Option<Uuid>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub approver_id: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<report_model::Model> for ReportResponse {
    fn from(model: report_model::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            report_type: model.report_type,
            report_period: model.report_period,
            uploader_id: model.uploader_id,
            task_area_id: model.task_area_id,
            file_name: model.file_name,
            description: model.description,
            status: model.status,
            is_viewed: model.is_viewed,
            viewed_by: model.viewed_by,
            viewed_at: model.viewed_at,
            approver_id: model.approver_id,
            approved_at: model.approved_at,
            created_at: model.created_at,
        }
    }
}
