// src/repository/report_repository.rs

use crate::domain::report_model::{self, Entity as ReportEntity, ReportStatus, ReportType};
use crate::domain::user_model::{self, Entity as UserEntity};
use crate::domain::visibility::{OwnerColumns, OwnerContext, VisibilityFilter};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::{
    ConnectionTrait, DbConn, DbErr, Order, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use uuid::Uuid;

pub type ReportWithOwner = (report_model::Model, OwnerContext);

#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: Arc<DbConn>,
}

// 所有任務区はレポート自身の列、ロールはアップロード者の列
fn report_owner_columns(
) -> OwnerColumns<report_model::Column, user_model::Column, report_model::Column> {
    OwnerColumns {
        owner_id: report_model::Column::UploaderId,
        owner_role: user_model::Column::Role,
        owner_task_area: report_model::Column::TaskAreaId,
    }
}

fn attach_owner(
    rows: Vec<(report_model::Model, Option<user_model::Model>)>,
) -> Vec<ReportWithOwner> {
    rows.into_iter()
        .filter_map(|(report, uploader)| {
            uploader.map(|u| {
                let owner = report.owner_context(u.role);
                (report, owner)
            })
        })
        .collect()
}

fn duplicate_report_error() -> AppError {
    AppError::ValidationError(
        "A report of this type for this period has already been uploaded for the task area"
            .to_string(),
    )
}

/// 登録するレポートの内容
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub report_type: ReportType,
    pub report_period: String,
    pub uploader_id: Uuid,
    pub task_area_id: Uuid,
    pub file_name: String,
    pub description: Option<String>,
}

/// レポート状態遷移の比較交換パラメータ
#[derive(Debug, Clone)]
pub struct ReportStatusChange {
    pub report_id: Uuid,
    pub allowed_from: Vec<ReportStatus>,
    pub to: ReportStatus,
    pub approver_id: Option<Uuid>,
}

impl ReportRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }

    pub async fn find_with_owner(&self, id: Uuid) -> Result<Option<ReportWithOwner>, DbErr> {
        let row = ReportEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(self.db.as_ref())
            .await?;
        Ok(attach_owner(row.into_iter().collect()).into_iter().next())
    }

    /// 可視範囲内のレポート一覧（作成日時の降順）
    pub async fn find_visible(
        &self,
        filter: &VisibilityFilter,
        report_type: Option<ReportType>,
    ) -> Result<Vec<ReportWithOwner>, DbErr> {
        let mut query = ReportEntity::find()
            .find_also_related(UserEntity)
            .filter(filter.condition(&report_owner_columns()));
        if let Some(report_type) = report_type {
            query = query.filter(report_model::Column::ReportType.eq(report_type));
        }
        let rows = query
            .order_by(report_model::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await?;
        Ok(attach_owner(rows))
    }

    /// 一意制約 (uploader, type, period, task_area) を確認して登録
    pub async fn insert(&self, new_report: NewReport) -> AppResult<report_model::Model> {
        let duplicates = ReportEntity::find()
            .filter(report_model::Column::UploaderId.eq(new_report.uploader_id))
            .filter(report_model::Column::ReportType.eq(new_report.report_type))
            .filter(report_model::Column::ReportPeriod.eq(new_report.report_period.clone()))
            .filter(report_model::Column::TaskAreaId.eq(new_report.task_area_id))
            .count(self.db.as_ref())
            .await?;
        if duplicates > 0 {
            return Err(duplicate_report_error());
        }

        let mut model = <report_model::ActiveModel as ActiveModelBehavior>::new();
        model.title = Set(new_report.title);
        model.report_type = Set(new_report.report_type);
        model.report_period = Set(new_report.report_period);
        model.uploader_id = Set(new_report.uploader_id);
        model.task_area_id = Set(new_report.task_area_id);
        model.file_name = Set(new_report.file_name);
        model.description = Set(new_report.description);

        // 事前確認をすり抜けた同時登録は一意制約違反として届く
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_report_error(),
            _ => AppError::DbErr(e),
        })
    }

    /// 未閲覧なら閲覧済みにする（最初の閲覧者のみ記録）
    pub async fn mark_viewed(&self, report_id: Uuid, viewer_id: Uuid) -> Result<bool, DbErr> {
        let mut changes: report_model::ActiveModel = ActiveModelTrait::default();
        changes.is_viewed = Set(true);
        changes.viewed_by = Set(Some(viewer_id));
        changes.viewed_at = Set(Some(Utc::now()));

        let result = ReportEntity::update_many()
            .set(changes)
            .filter(report_model::Column::Id.eq(report_id))
            .filter(report_model::Column::IsViewed.eq(false))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// 状態を比較交換で更新
    pub async fn change_status<C>(conn: &C, change: &ReportStatusChange) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        let mut changes: report_model::ActiveModel = ActiveModelTrait::default();
        changes.status = Set(change.to);
        changes.updated_at = Set(now);
        if let Some(approver_id) = change.approver_id {
            changes.approver_id = Set(Some(approver_id));
            changes.approved_at = Set(Some(now));
        }

        let result = ReportEntity::update_many()
            .set(changes)
            .filter(report_model::Column::Id.eq(change.report_id))
            .filter(report_model::Column::Status.is_in(change.allowed_from.clone()))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::StateConflict(format!(
                "Report {} was changed by someone else",
                change.report_id
            )));
        }
        Ok(())
    }
}
