// portal-backend/src/utils/permission.rs

//! アクセス判定。すべて (アクター, 対象) の純粋関数で、`false` は拒否を意味する。

use crate::domain::leave_status::LeaveStatus;
use crate::domain::principal::Principal;
use crate::domain::user_role::UserRole;
use crate::domain::visibility::{OwnerContext, VisibilityRule};
use crate::error::{AppError, AppResult};
use uuid::Uuid;

/// 統合された権限チェック機能
pub struct PermissionChecker;

impl PermissionChecker {
    /// 対象ユーザーを参照できるか
    pub fn can_view_user(actor: &Principal, target: &OwnerContext) -> bool {
        VisibilityRule::for_principal(actor).matches(target)
    }

    /// 対象ユーザーを管理（ロール・任務区の変更）できるか
    pub fn can_manage_user(actor: &Principal, target: &OwnerContext) -> bool {
        match actor.role {
            UserRole::Superuser => true,
            UserRole::HeadManager => match target.owner_role {
                // 総部責任者はスーパーユーザーや他の総部責任者を管理できない
                UserRole::Superuser | UserRole::HeadManager => false,
                UserRole::TaskAreaManager | UserRole::Employee => {
                    actor.manages_task_area(target.owner_task_area_id)
                }
            },
            UserRole::TaskAreaManager => {
                target.owner_role == UserRole::Employee
                    && actor.shares_task_area(target.owner_task_area_id)
            }
            UserRole::Employee => false,
        }
    }

    /// 付与できるロールか
    pub fn can_grant_role(actor: &Principal, role: UserRole) -> bool {
        match actor.role {
            UserRole::Superuser => true,
            UserRole::HeadManager => {
                matches!(role, UserRole::TaskAreaManager | UserRole::Employee)
            }
            UserRole::TaskAreaManager => role == UserRole::Employee,
            UserRole::Employee => false,
        }
    }

    /// ユーザーを無効化できるか（スーパーユーザーのみ・自分自身は不可）
    pub fn can_deactivate_user(actor: &Principal, target_id: Uuid) -> bool {
        actor.role.is_superuser() && actor.user_id != target_id
    }

    /// 休暇申請を現在の段階で承認・却下できるか
    pub fn can_approve_leave(
        actor: &Principal,
        status: LeaveStatus,
        applicant: &OwnerContext,
    ) -> bool {
        match actor.role {
            UserRole::Superuser => true,
            UserRole::TaskAreaManager => {
                status == LeaveStatus::PendingTaskArea
                    && actor.shares_task_area(applicant.owner_task_area_id)
            }
            UserRole::HeadManager => {
                status == LeaveStatus::PendingHead
                    && actor.manages_task_area(applicant.owner_task_area_id)
            }
            UserRole::Employee => false,
        }
    }

    /// 休暇申請を参照できるか（申請者に対する可視性）
    pub fn can_view_leave(actor: &Principal, applicant: &OwnerContext) -> bool {
        VisibilityRule::for_principal(actor).matches(applicant)
    }

    /// 休暇を申請できるか
    pub fn can_apply_leave(actor: &Principal) -> bool {
        actor.role.needs_leave_approval()
    }

    /// レポートを参照できるか
    pub fn can_view_report(actor: &Principal, report_owner: &OwnerContext) -> bool {
        VisibilityRule::for_principal(actor).matches(report_owner)
    }

    /// レポートをレビュー・承認できるか
    pub fn can_approve_report(actor: &Principal, report_task_area_id: Option<Uuid>) -> bool {
        match actor.role {
            UserRole::Superuser => true,
            UserRole::HeadManager => actor.manages_task_area(report_task_area_id),
            UserRole::TaskAreaManager => actor.shares_task_area(report_task_area_id),
            UserRole::Employee => false,
        }
    }

    /// 緊急アラートを参照できるか
    pub fn can_view_alert(actor: &Principal, sender: &OwnerContext) -> bool {
        VisibilityRule::for_principal(actor).matches(sender)
    }

    /// 緊急アラートを対応・解決できるか
    pub fn can_handle_alert(actor: &Principal, sender: &OwnerContext) -> bool {
        match actor.role {
            UserRole::Superuser => true,
            UserRole::HeadManager => actor.manages_task_area(sender.owner_task_area_id),
            UserRole::TaskAreaManager => actor.shares_task_area(sender.owner_task_area_id),
            UserRole::Employee => false,
        }
    }

    /// 自分の位置情報を更新できるか
    pub fn can_update_location(actor: &Principal) -> bool {
        matches!(
            actor.role,
            UserRole::Employee | UserRole::TaskAreaManager
        )
    }

    /// 他ユーザーの位置情報一覧を参照できるか
    pub fn can_view_locations(actor: &Principal) -> bool {
        actor.role.is_manager_or_above()
    }

    /// 書き込み経路用: 判定結果を Forbidden に変換
    pub fn ensure(allowed: bool, message: impl Into<String>) -> AppResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.into()))
        }
    }
}
