// portal-backend/src/service/report_service.rs

use crate::domain::principal::Principal;
use crate::domain::report_model::{self, ReportStatus, ReportType};
use crate::domain::visibility::{visibility_filter, ResourceKind};
use crate::error::{AppError, AppResult};
use crate::repository::report_repository::{
    NewReport, ReportRepository, ReportStatusChange, ReportWithOwner,
};
use crate::utils::permission::PermissionChecker;
use crate::utils::validation::validate_report_period;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// アップロードされるレポートの内容
#[derive(Debug, Clone)]
pub struct ReportUpload {
    pub title: String,
    pub report_type: ReportType,
    pub report_period: String,
    pub file_name: String,
    pub description: Option<String>,
}

pub struct ReportService {
    db: Arc<DatabaseConnection>,
    report_repository: ReportRepository,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            report_repository: ReportRepository::new(db.clone()),
            db,
        }
    }

    /// レポートを登録（所有任務区はアップロード者の所属任務区）
    pub async fn upload(
        &self,
        actor: &Principal,
        upload: ReportUpload,
    ) -> AppResult<report_model::Model> {
        let task_area_id = actor.task_area_id.ok_or_else(|| {
            AppError::ValidationError(
                "task_area: uploader must belong to a task area".to_string(),
            )
        })?;
        validate_report_period(upload.report_type, &upload.report_period)
            .map_err(AppError::ValidationError)?;

        let report = self
            .report_repository
            .insert(NewReport {
                title: upload.title.trim().to_string(),
                report_type: upload.report_type,
                report_period: upload.report_period.trim().to_string(),
                uploader_id: actor.user_id,
                task_area_id,
                file_name: upload.file_name,
                description: upload.description,
            })
            .await?;

        info!(
            report_id = %report.id,
            uploader_id = %report.uploader_id,
            report_type = %report.report_type,
            period = %report.report_period,
            "Report uploaded"
        );
        Ok(report)
    }

    pub async fn list(
        &self,
        actor: &Principal,
        report_type: Option<ReportType>,
    ) -> AppResult<Vec<ReportWithOwner>> {
        let filter = visibility_filter(actor, ResourceKind::Report);
        let rows = self
            .report_repository
            .find_visible(&filter, report_type)
            .await?;
        Ok(filter.apply(rows))
    }

    /// レポート詳細。管理者が他人のレポートを初めて開いたら閲覧済みにする。
    pub async fn detail(&self, actor: &Principal, id: Uuid) -> AppResult<report_model::Model> {
        let not_found = || AppError::NotFound(format!("Report {} not found", id));
        let (mut report, owner) = self
            .report_repository
            .find_with_owner(id)
            .await?
            .ok_or_else(not_found)?;

        if !PermissionChecker::can_view_report(actor, &owner) {
            debug!(user_id = %actor.user_id, report_id = %id, "Report outside scope");
            return Err(not_found());
        }

        if actor.role.is_manager_or_above()
            && !report.is_uploader(actor.user_id)
            && !report.is_viewed
            && self.report_repository.mark_viewed(id, actor.user_id).await?
        {
            report.is_viewed = true;
            report.viewed_by = Some(actor.user_id);
            report.viewed_at = Some(Utc::now());
        }
        Ok(report)
    }

    /// SUBMITTED → REVIEWED
    pub async fn review(&self, actor: &Principal, id: Uuid) -> AppResult<report_model::Model> {
        let report = self.find_for_decision(actor, id).await?;
        if !report.status.can_be_reviewed() {
            return Err(AppError::StateConflict(format!(
                "Report {} cannot be reviewed in status '{}'",
                id, report.status
            )));
        }
        self.ensure_can_approve(actor, &report)?;

        let change = ReportStatusChange {
            report_id: id,
            allowed_from: vec![ReportStatus::Submitted],
            to: ReportStatus::Reviewed,
            approver_id: None,
        };
        ReportRepository::change_status(self.db.as_ref(), &change).await?;

        info!(report_id = %id, reviewer_id = %actor.user_id, "Report reviewed");
        Ok(report_model::Model {
            status: ReportStatus::Reviewed,
            updated_at: Utc::now(),
            ..report
        })
    }

    /// SUBMITTED/REVIEWED → APPROVED
    pub async fn approve(&self, actor: &Principal, id: Uuid) -> AppResult<report_model::Model> {
        let report = self.find_for_decision(actor, id).await?;
        if !report.status.can_be_approved() {
            return Err(AppError::StateConflict(format!(
                "Report {} cannot be approved in status '{}'",
                id, report.status
            )));
        }
        self.ensure_can_approve(actor, &report)?;

        let change = ReportStatusChange {
            report_id: id,
            allowed_from: vec![ReportStatus::Submitted, ReportStatus::Reviewed],
            to: ReportStatus::Approved,
            approver_id: Some(actor.user_id),
        };
        ReportRepository::change_status(self.db.as_ref(), &change).await?;

        info!(report_id = %id, approver_id = %actor.user_id, "Report approved");
        let now = Utc::now();
        Ok(report_model::Model {
            status: ReportStatus::Approved,
            approver_id: Some(actor.user_id),
            approved_at: Some(now),
            updated_at: now,
            ..report
        })
    }

    async fn find_for_decision(
        &self,
        actor: &Principal,
        id: Uuid,
    ) -> AppResult<report_model::Model> {
        let (report, owner) = self
            .report_repository
            .find_with_owner(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        if !PermissionChecker::can_view_report(actor, &owner) {
            warn!(user_id = %actor.user_id, report_id = %id, "Report decision outside scope");
            return Err(AppError::Forbidden(format!(
                "Report {} is outside your scope",
                id
            )));
        }
        Ok(report)
    }

    fn ensure_can_approve(&self, actor: &Principal, report: &report_model::Model) -> AppResult<()> {
        PermissionChecker::ensure(
            PermissionChecker::can_approve_report(actor, Some(report.task_area_id)),
            format!("You cannot review or approve report {}", report.id),
        )
        .inspect_err(|_| {
            warn!(
                user_id = %actor.user_id,
                report_id = %report.id,
                "Report decision denied"
            )
        })
    }
}
