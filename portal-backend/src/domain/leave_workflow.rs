// portal-backend/src/domain/leave_workflow.rs

//! 休暇申請の二段階承認ワークフロー。
//!
//! 各操作は現在の申請内容とアクターから次の状態を計算するだけで、永続化はしない。
//! 返された `LeaveTransition` はリポジトリ層で `status` の比較交換として適用される。

use super::approval_record_model::{self, ApprovalAction};
use super::leave_application_model::{self, Model as LeaveApplication};
use super::leave_status::LeaveStatus;
use super::principal::Principal;
use super::user_role::UserRole;
use super::visibility::OwnerContext;
use crate::error::{AppError, AppResult};
use crate::utils::permission::PermissionChecker;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde::Serialize;
use uuid::Uuid;

/// 遷移に伴う申請レコードの変更内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionEffect {
    Submitted,
    TaskAreaApproved {
        approver_id: Uuid,
        at: DateTime<Utc>,
    },
    HeadApproved {
        approver_id: Uuid,
        at: DateTime<Utc>,
    },
    Rejected {
        rejected_by: Uuid,
        reason: Option<String>,
    },
    Cancelled {
        reason: Option<String>,
        at: DateTime<Utc>,
    },
}

/// 承認履歴に追記するエントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub leave_application_id: Uuid,
    pub approver_id: Uuid,
    pub action: ApprovalAction,
    pub comment: Option<String>,
    pub approval_date: DateTime<Utc>,
}

impl AuditEntry {
    pub fn into_active_model(self) -> approval_record_model::ActiveModel {
        approval_record_model::ActiveModel {
            id: Set(Uuid::new_v4()),
            leave_application_id: Set(self.leave_application_id),
            approver_id: Set(self.approver_id),
            action: Set(self.action),
            comment: Set(self.comment),
            approval_date: Set(self.approval_date),
        }
    }
}

/// 計算済みの状態遷移
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaveTransition {
    pub application_id: Uuid,
    /// 比較交換の期待値
    pub from: LeaveStatus,
    pub to: LeaveStatus,
    pub effect: TransitionEffect,
    pub audit: AuditEntry,
}

impl LeaveTransition {
    fn new(
        application: &LeaveApplication,
        to: LeaveStatus,
        effect: TransitionEffect,
        actor_id: Uuid,
        action: ApprovalAction,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(application.status.can_transition_to(to));
        Self {
            application_id: application.id,
            from: application.status,
            to,
            effect,
            audit: AuditEntry {
                leave_application_id: application.id,
                approver_id: actor_id,
                action,
                comment,
                approval_date: at,
            },
        }
    }

    /// UPDATE 用の変更列（未変更の列は NotSet）
    pub fn changes(&self) -> leave_application_model::ActiveModel {
        let mut model: leave_application_model::ActiveModel = ActiveModelTrait::default();
        model.status = Set(self.to);
        model.updated_at = Set(self.audit.approval_date);

        match &self.effect {
            TransitionEffect::Submitted => {}
            TransitionEffect::TaskAreaApproved { approver_id, at } => {
                model.task_area_manager_approved = Set(true);
                model.task_area_manager_approver_id = Set(Some(*approver_id));
                model.task_area_manager_approval_date = Set(Some(*at));
            }
            TransitionEffect::HeadApproved { approver_id, at } => {
                model.head_manager_approved = Set(true);
                model.head_manager_approver_id = Set(Some(*approver_id));
                model.head_manager_approval_date = Set(Some(*at));
            }
            TransitionEffect::Rejected {
                rejected_by,
                reason,
            } => {
                model.rejected_by = Set(Some(*rejected_by));
                model.rejection_reason = Set(reason.clone());
            }
            TransitionEffect::Cancelled { reason, at } => {
                model.cancellation_reason = Set(reason.clone());
                model.cancellation_date = Set(Some(*at));
            }
        }
        model
    }

    /// 遷移をメモリ上のレコードに適用した結果
    pub fn apply_to(&self, application: &LeaveApplication) -> LeaveApplication {
        let mut next = application.clone();
        next.status = self.to;
        next.updated_at = self.audit.approval_date;

        match &self.effect {
            TransitionEffect::Submitted => {}
            TransitionEffect::TaskAreaApproved { approver_id, at } => {
                next.task_area_manager_approved = true;
                next.task_area_manager_approver_id = Some(*approver_id);
                next.task_area_manager_approval_date = Some(*at);
            }
            TransitionEffect::HeadApproved { approver_id, at } => {
                next.head_manager_approved = true;
                next.head_manager_approver_id = Some(*approver_id);
                next.head_manager_approval_date = Some(*at);
            }
            TransitionEffect::Rejected {
                rejected_by,
                reason,
            } => {
                next.rejected_by = Some(*rejected_by);
                next.rejection_reason = reason.clone();
            }
            TransitionEffect::Cancelled { reason, at } => {
                next.cancellation_reason = reason.clone();
                next.cancellation_date = Some(*at);
            }
        }
        next
    }
}

fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn stale_state(application: &LeaveApplication, operation: &str) -> AppError {
    AppError::StateConflict(format!(
        "Leave application {} cannot be {} in status '{}'",
        application.id, operation, application.status
    ))
}

// 任務区段階を通過済みで、アクターがその段階の決裁者だったか
fn task_area_stage_passed(
    actor: &Principal,
    application: &LeaveApplication,
    applicant: &OwnerContext,
) -> bool {
    application.status == LeaveStatus::PendingHead
        && application.task_area_manager_approved
        && PermissionChecker::can_approve_leave(actor, LeaveStatus::PendingTaskArea, applicant)
}

/// 承認・却下の前提条件
///
/// 終了状態、またはアクターが決裁できた段階を既に過ぎている場合は状態競合。
/// 先に読んだ他の決裁者に追い越された場合もこれに当たる。
fn ensure_decidable(
    actor: &Principal,
    application: &LeaveApplication,
    applicant: &OwnerContext,
    verb: &str,
    participle: &str,
) -> AppResult<()> {
    let status = application.status;
    if status.is_pending() && PermissionChecker::can_approve_leave(actor, status, applicant) {
        return Ok(());
    }
    if !status.is_pending() || task_area_stage_passed(actor, application, applicant) {
        return Err(stale_state(application, participle));
    }
    Err(AppError::Forbidden(format!(
        "User {} cannot {} leave application {} at this stage",
        actor.user_id, verb, application.id
    )))
}

/// 申請者による提出（DRAFT → 承認待ち）
///
/// 任務区責任者の申請は任務区段階を飛ばして総部承認待ちになる。
pub fn submit(actor: &Principal, application: &LeaveApplication) -> AppResult<LeaveTransition> {
    if !application.is_applicant(actor.user_id) {
        return Err(AppError::Forbidden(
            "Only the applicant can submit a leave application".to_string(),
        ));
    }
    if !PermissionChecker::can_apply_leave(actor) {
        return Err(AppError::Forbidden(format!(
            "Role '{}' does not require leave approval",
            actor.role
        )));
    }
    if application.status != LeaveStatus::Draft {
        return Err(stale_state(application, "submitted"));
    }

    let to = match actor.role {
        UserRole::TaskAreaManager => LeaveStatus::PendingHead,
        _ => LeaveStatus::PendingTaskArea,
    };

    Ok(LeaveTransition::new(
        application,
        to,
        TransitionEffect::Submitted,
        actor.user_id,
        ApprovalAction::Submitted,
        None,
        Utc::now(),
    ))
}

/// 現在の段階での承認
pub fn approve(
    actor: &Principal,
    application: &LeaveApplication,
    applicant: &OwnerContext,
    comment: Option<String>,
) -> AppResult<LeaveTransition> {
    ensure_decidable(actor, application, applicant, "approve", "approved")?;

    let at = Utc::now();
    let (to, effect) = match application.status {
        LeaveStatus::PendingTaskArea => (
            LeaveStatus::PendingHead,
            TransitionEffect::TaskAreaApproved {
                approver_id: actor.user_id,
                at,
            },
        ),
        LeaveStatus::PendingHead => (
            LeaveStatus::Approved,
            TransitionEffect::HeadApproved {
                approver_id: actor.user_id,
                at,
            },
        ),
        _ => return Err(stale_state(application, "approved")),
    };

    Ok(LeaveTransition::new(
        application,
        to,
        effect,
        actor.user_id,
        ApprovalAction::Approved,
        normalize_text(comment),
        at,
    ))
}

/// 却下（どちらの承認待ち段階からも可能）
pub fn reject(
    actor: &Principal,
    application: &LeaveApplication,
    applicant: &OwnerContext,
    reason: Option<String>,
) -> AppResult<LeaveTransition> {
    ensure_decidable(actor, application, applicant, "reject", "rejected")?;

    let reason = normalize_text(reason);
    Ok(LeaveTransition::new(
        application,
        LeaveStatus::Rejected,
        TransitionEffect::Rejected {
            rejected_by: actor.user_id,
            reason: reason.clone(),
        },
        actor.user_id,
        ApprovalAction::Rejected,
        reason,
        Utc::now(),
    ))
}

/// 申請者による取消（承認待ち・承認済みから）
pub fn cancel(
    actor: &Principal,
    application: &LeaveApplication,
    reason: Option<String>,
) -> AppResult<LeaveTransition> {
    if !application.is_applicant(actor.user_id) {
        return Err(AppError::Forbidden(
            "Only the applicant can cancel a leave application".to_string(),
        ));
    }
    if !application.status.is_cancellable() {
        return Err(stale_state(application, "cancelled"));
    }

    let at = Utc::now();
    let reason = normalize_text(reason);
    Ok(LeaveTransition::new(
        application,
        LeaveStatus::Cancelled,
        TransitionEffect::Cancelled {
            reason: reason.clone(),
            at,
        },
        actor.user_id,
        ApprovalAction::Cancelled,
        reason,
        at,
    ))
}

/// 下書きの内容を編集できるか（申請者のみ・DRAFT のみ）
pub fn ensure_editable(actor: &Principal, application: &LeaveApplication) -> AppResult<()> {
    if !application.is_applicant(actor.user_id) {
        return Err(AppError::Forbidden(
            "Only the applicant can edit a leave application".to_string(),
        ));
    }
    if application.status != LeaveStatus::Draft {
        return Err(stale_state(application, "edited"));
    }
    Ok(())
}
