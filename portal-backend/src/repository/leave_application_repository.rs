// src/repository/leave_application_repository.rs

use crate::domain::leave_application_model::{self, Entity as LeaveApplicationEntity};
use crate::domain::leave_status::LeaveStatus;
use crate::domain::leave_workflow::LeaveTransition;
use crate::domain::user_model::{self, Entity as UserEntity};
use crate::domain::visibility::{OwnerColumns, OwnerContext, VisibilityFilter};
use crate::error::{AppError, AppResult};
use crate::repository::approval_record_repository::ApprovalRecordRepository;
use sea_orm::entity::*;
use sea_orm::{ConnectionTrait, DbConn, DbErr, Order, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

/// 申請と申請者の所有者情報
pub type LeaveWithApplicant = (leave_application_model::Model, OwnerContext);

#[derive(Debug, Clone)]
pub struct LeaveApplicationRepository {
    db: Arc<DbConn>,
}

// 申請者（JOIN したユーザー表）の列で可視性を判定する
fn applicant_columns(
) -> OwnerColumns<leave_application_model::Column, user_model::Column, user_model::Column> {
    OwnerColumns {
        owner_id: leave_application_model::Column::ApplicantId,
        owner_role: user_model::Column::Role,
        owner_task_area: user_model::Column::TaskAreaId,
    }
}

fn attach_applicant(
    rows: Vec<(leave_application_model::Model, Option<user_model::Model>)>,
) -> Vec<LeaveWithApplicant> {
    rows.into_iter()
        .filter_map(|(application, applicant)| {
            applicant.map(|user| (application, OwnerContext::of_user(&user)))
        })
        .collect()
}

impl LeaveApplicationRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }

    pub async fn find_with_applicant(&self, id: Uuid) -> Result<Option<LeaveWithApplicant>, DbErr> {
        let row = LeaveApplicationEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(self.db.as_ref())
            .await?;
        Ok(row.and_then(|(application, applicant)| {
            applicant.map(|user| (application, OwnerContext::of_user(&user)))
        }))
    }

    /// 可視範囲内の申請一覧（作成日時の降順）
    pub async fn find_visible(
        &self,
        filter: &VisibilityFilter,
        status: Option<LeaveStatus>,
    ) -> Result<Vec<LeaveWithApplicant>, DbErr> {
        let mut query = LeaveApplicationEntity::find()
            .find_also_related(UserEntity)
            .filter(filter.condition(&applicant_columns()));
        if let Some(status) = status {
            query = query.filter(leave_application_model::Column::Status.eq(status));
        }
        let rows = query
            .order_by(leave_application_model::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await?;
        Ok(attach_applicant(rows))
    }

    /// 可視範囲内の承認待ち申請
    pub async fn find_pending_visible(
        &self,
        filter: &VisibilityFilter,
    ) -> Result<Vec<LeaveWithApplicant>, DbErr> {
        let rows = LeaveApplicationEntity::find()
            .find_also_related(UserEntity)
            .filter(filter.condition(&applicant_columns()))
            .filter(leave_application_model::Column::Status.is_in([
                LeaveStatus::PendingTaskArea,
                LeaveStatus::PendingHead,
            ]))
            .order_by(leave_application_model::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await?;
        Ok(attach_applicant(rows))
    }

    pub async fn insert<C>(
        conn: &C,
        model: leave_application_model::ActiveModel,
    ) -> Result<leave_application_model::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        model.insert(conn).await
    }

    /// 下書きの内容を更新（DRAFT のままの場合のみ）
    pub async fn update_draft(
        &self,
        id: Uuid,
        changes: leave_application_model::ActiveModel,
    ) -> AppResult<()> {
        let result = LeaveApplicationEntity::update_many()
            .set(changes)
            .filter(leave_application_model::Column::Id.eq(id))
            .filter(leave_application_model::Column::Status.eq(LeaveStatus::Draft))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::StateConflict(format!(
                "Leave application {} is no longer a draft",
                id
            )));
        }
        Ok(())
    }

    /// 状態遷移を比較交換で適用し、承認履歴を1件追記する
    ///
    /// 現在の状態が `transition.from` と異なれば更新せず `StateConflict` を返す。
    /// 呼び出し側のトランザクション内で実行すること。
    pub async fn apply_transition<C>(conn: &C, transition: &LeaveTransition) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = LeaveApplicationEntity::update_many()
            .set(transition.changes())
            .filter(leave_application_model::Column::Id.eq(transition.application_id))
            .filter(leave_application_model::Column::Status.eq(transition.from))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::StateConflict(format!(
                "Leave application {} was changed by someone else (expected status '{}')",
                transition.application_id, transition.from
            )));
        }

        ApprovalRecordRepository::append(conn, transition.audit.clone()).await?;
        Ok(())
    }
}
