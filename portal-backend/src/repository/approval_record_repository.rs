// src/repository/approval_record_repository.rs

use crate::domain::approval_record_model::{self, Entity as ApprovalRecordEntity};
use crate::domain::leave_workflow::AuditEntry;
use sea_orm::entity::*;
use sea_orm::{ConnectionTrait, DbConn, DbErr, Order, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

/// 承認履歴（追記のみ。更新・削除は提供しない）
#[derive(Debug, Clone)]
pub struct ApprovalRecordRepository {
    db: Arc<DbConn>,
}

impl ApprovalRecordRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }

    pub async fn append<C>(conn: &C, entry: AuditEntry) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        ApprovalRecordEntity::insert(entry.into_active_model())
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// 申請の承認履歴（新しい順）
    pub async fn find_by_application(
        &self,
        leave_application_id: Uuid,
    ) -> Result<Vec<approval_record_model::Model>, DbErr> {
        ApprovalRecordEntity::find()
            .filter(approval_record_model::Column::LeaveApplicationId.eq(leave_application_id))
            .order_by(approval_record_model::Column::ApprovalDate, Order::Desc)
            .all(self.db.as_ref())
            .await
    }
}
