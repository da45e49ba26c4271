// portal-backend/src/service/leave_service.rs

use crate::domain::approval_record_model;
use crate::domain::leave_application_model::{self, validate_leave_period};
use crate::domain::leave_status::LeaveStatus;
use crate::domain::leave_workflow::{self, LeaveTransition};
use crate::domain::principal::Principal;
use crate::domain::user_model::validate_coordinates;
use crate::domain::visibility::{visibility_filter, OwnerContext, ResourceKind};
use crate::error::{AppError, AppResult};
use crate::repository::approval_record_repository::ApprovalRecordRepository;
use crate::repository::leave_application_repository::{
    LeaveApplicationRepository, LeaveWithApplicant,
};
use crate::utils::permission::PermissionChecker;
use crate::utils::transaction::run_atomic;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 休暇申請の内容
#[derive(Debug, Clone)]
pub struct LeaveContent {
    pub leave_start_date: NaiveDate,
    pub leave_end_date: NaiveDate,
    pub leave_location: String,
    pub leave_latitude: Option<f64>,
    pub leave_longitude: Option<f64>,
    pub leave_reason: String,
}

impl LeaveContent {
    fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if let Err(message) = validate_leave_period(self.leave_start_date, self.leave_end_date) {
            errors.push(message);
        }
        match (self.leave_latitude, self.leave_longitude) {
            (Some(lat), Some(lon)) => {
                if let Err(message) = validate_coordinates(lat, lon) {
                    errors.push(format!("leave_location: {}", message));
                }
            }
            (None, None) => {}
            _ => errors.push(
                "leave_location: latitude and longitude must be given together".to_string(),
            ),
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(AppError::ValidationError(errors.remove(0))),
            _ => Err(AppError::ValidationErrors(errors)),
        }
    }
}

pub struct LeaveService {
    db: Arc<DatabaseConnection>,
    leave_repository: LeaveApplicationRepository,
    approval_record_repository: ApprovalRecordRepository,
}

impl LeaveService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            leave_repository: LeaveApplicationRepository::new(db.clone()),
            approval_record_repository: ApprovalRecordRepository::new(db.clone()),
            db,
        }
    }

    /// 休暇申請を作成（既定ではそのまま提出する）
    pub async fn create(
        &self,
        actor: &Principal,
        content: LeaveContent,
        submit: bool,
    ) -> AppResult<leave_application_model::Model> {
        if !PermissionChecker::can_apply_leave(actor) {
            warn!(
                user_id = %actor.user_id,
                role = %actor.role,
                "Leave application attempted by a role without leave approval"
            );
            return Err(AppError::Forbidden(format!(
                "Role '{}' does not apply for leave",
                actor.role
            )));
        }
        content.validate()?;

        let mut model = <leave_application_model::ActiveModel as ActiveModelBehavior>::new();
        model.applicant_id = Set(actor.user_id);
        model.leave_start_date = Set(content.leave_start_date);
        model.leave_end_date = Set(content.leave_end_date);
        model.leave_location = Set(content.leave_location.trim().to_string());
        model.leave_latitude = Set(content.leave_latitude);
        model.leave_longitude = Set(content.leave_longitude);
        model.leave_reason = Set(content.leave_reason.trim().to_string());

        let actor = actor.clone();
        let created = run_atomic(&self.db, "leave_create", move |txn| {
            Box::pin(async move {
                let draft = LeaveApplicationRepository::insert(txn, model).await?;
                if !submit {
                    return Ok(draft);
                }
                let transition = leave_workflow::submit(&actor, &draft)?;
                LeaveApplicationRepository::apply_transition(txn, &transition).await?;
                Ok(transition.apply_to(&draft))
            })
        })
        .await?;

        info!(
            application_id = %created.id,
            applicant_id = %created.applicant_id,
            status = %created.status,
            duration_days = created.duration_days(),
            "Leave application created"
        );
        Ok(created)
    }

    /// 下書きの内容を更新（申請者のみ）
    pub async fn update_draft(
        &self,
        actor: &Principal,
        id: Uuid,
        content: LeaveContent,
    ) -> AppResult<leave_application_model::Model> {
        let (application, _) = self.find_visible(actor, id).await?;
        leave_workflow::ensure_editable(actor, &application)?;
        content.validate()?;

        let mut changes: leave_application_model::ActiveModel = ActiveModelTrait::default();
        changes.leave_start_date = Set(content.leave_start_date);
        changes.leave_end_date = Set(content.leave_end_date);
        changes.leave_location = Set(content.leave_location.trim().to_string());
        changes.leave_latitude = Set(content.leave_latitude);
        changes.leave_longitude = Set(content.leave_longitude);
        changes.leave_reason = Set(content.leave_reason.trim().to_string());
        changes.updated_at = Set(Utc::now());
        self.leave_repository.update_draft(id, changes).await?;

        let (updated, _) = self.find_visible(actor, id).await?;
        debug!(application_id = %id, "Leave draft updated");
        Ok(updated)
    }

    /// 下書きを提出
    pub async fn submit(
        &self,
        actor: &Principal,
        id: Uuid,
    ) -> AppResult<leave_application_model::Model> {
        let (application, _) = self.find_visible(actor, id).await?;
        let transition = leave_workflow::submit(actor, &application)?;
        self.commit_transition(application, transition).await
    }

    /// 現在の段階で承認
    pub async fn approve(
        &self,
        actor: &Principal,
        id: Uuid,
        comment: Option<String>,
    ) -> AppResult<leave_application_model::Model> {
        let (application, applicant) = self.find_for_decision(actor, id).await?;
        let transition = leave_workflow::approve(actor, &application, &applicant, comment)
            .inspect_err(|e| log_rejected_decision(actor, id, "approve", e))?;
        self.commit_transition(application, transition).await
    }

    /// 却下
    pub async fn reject(
        &self,
        actor: &Principal,
        id: Uuid,
        reason: Option<String>,
    ) -> AppResult<leave_application_model::Model> {
        let (application, applicant) = self.find_for_decision(actor, id).await?;
        let transition = leave_workflow::reject(actor, &application, &applicant, reason)
            .inspect_err(|e| log_rejected_decision(actor, id, "reject", e))?;
        self.commit_transition(application, transition).await
    }

    /// 申請者による取消
    pub async fn cancel(
        &self,
        actor: &Principal,
        id: Uuid,
        reason: Option<String>,
    ) -> AppResult<leave_application_model::Model> {
        let (application, _) = self.find_for_decision(actor, id).await?;
        let transition = leave_workflow::cancel(actor, &application, reason)
            .inspect_err(|e| log_rejected_decision(actor, id, "cancel", e))?;
        self.commit_transition(application, transition).await
    }

    /// 参照可能な申請の詳細（範囲外は存在しない扱い）
    pub async fn get(&self, actor: &Principal, id: Uuid) -> AppResult<LeaveWithApplicant> {
        self.find_visible(actor, id).await
    }

    /// 参照可能な申請一覧
    pub async fn list(
        &self,
        actor: &Principal,
        status: Option<LeaveStatus>,
    ) -> AppResult<Vec<LeaveWithApplicant>> {
        let filter = visibility_filter(actor, ResourceKind::LeaveApplication);
        let rows = self.leave_repository.find_visible(&filter, status).await?;
        let visible = filter.apply(rows);
        debug!(user_id = %actor.user_id, count = visible.len(), "Listed leave applications");
        Ok(visible)
    }

    /// アクターが今承認できる申請
    pub async fn pending_for(&self, actor: &Principal) -> AppResult<Vec<LeaveWithApplicant>> {
        let filter = visibility_filter(actor, ResourceKind::LeaveApplication);
        let rows = self.leave_repository.find_pending_visible(&filter).await?;
        Ok(filter
            .apply(rows)
            .into_iter()
            .filter(|(application, applicant)| {
                PermissionChecker::can_approve_leave(actor, application.status, applicant)
            })
            .collect())
    }

    /// 承認履歴（新しい順）
    pub async fn history(
        &self,
        actor: &Principal,
        id: Uuid,
    ) -> AppResult<Vec<approval_record_model::Model>> {
        let (application, _) = self.find_visible(actor, id).await?;
        Ok(self
            .approval_record_repository
            .find_by_application(application.id)
            .await?)
    }

    async fn find_visible(&self, actor: &Principal, id: Uuid) -> AppResult<LeaveWithApplicant> {
        let not_found = || AppError::NotFound(format!("Leave application {} not found", id));
        let (application, applicant) = self
            .leave_repository
            .find_with_applicant(id)
            .await?
            .ok_or_else(not_found)?;

        if !PermissionChecker::can_view_leave(actor, &applicant) {
            debug!(user_id = %actor.user_id, application_id = %id, "Leave application outside scope");
            return Err(not_found());
        }
        Ok((application, applicant))
    }

    // 書き込み経路: 範囲外は権限エラー
    async fn find_for_decision(
        &self,
        actor: &Principal,
        id: Uuid,
    ) -> AppResult<(leave_application_model::Model, OwnerContext)> {
        let (application, applicant) = self
            .leave_repository
            .find_with_applicant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Leave application {} not found", id)))?;

        if !PermissionChecker::can_view_leave(actor, &applicant) {
            warn!(
                user_id = %actor.user_id,
                application_id = %id,
                "Leave decision attempted outside scope"
            );
            return Err(AppError::Forbidden(format!(
                "Leave application {} is outside your scope",
                id
            )));
        }
        Ok((application, applicant))
    }

    async fn commit_transition(
        &self,
        application: leave_application_model::Model,
        transition: LeaveTransition,
    ) -> AppResult<leave_application_model::Model> {
        let pending = transition.clone();
        run_atomic(&self.db, "leave_transition", move |txn| {
            Box::pin(async move {
                LeaveApplicationRepository::apply_transition(txn, &pending).await
            })
        })
        .await
        .inspect_err(|e| {
            if e.is_state_conflict() {
                warn!(
                    application_id = %transition.application_id,
                    expected = %transition.from,
                    "Leave transition lost a concurrent update"
                );
            }
        })?;

        info!(
            application_id = %transition.application_id,
            actor_id = %transition.audit.approver_id,
            action = %transition.audit.action,
            from = %transition.from,
            to = %transition.to,
            "Leave application transitioned"
        );
        Ok(transition.apply_to(&application))
    }
}

fn log_rejected_decision(actor: &Principal, id: Uuid, operation: &str, error: &AppError) {
    warn!(
        user_id = %actor.user_id,
        role = %actor.role,
        application_id = %id,
        operation = operation,
        error_kind = error.kind().as_str(),
        "Leave decision rejected"
    );
}
