// portal-backend/src/domain/leave_application_model.rs

use super::leave_status::{ApprovalStage, LeaveStatus};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub applicant_id: Uuid,

    pub leave_start_date: NaiveDate,

    pub leave_end_date: NaiveDate,

    pub leave_location: String,

    #[sea_orm(nullable)]
    pub leave_latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub leave_longitude: Option<f64>,

    #[sea_orm(column_type = "Text")]
    pub leave_reason: String,

    pub status: LeaveStatus,

    // 任務区責任者の承認
    pub task_area_manager_approved: bool,

    #[sea_orm(nullable)]
    pub task_area_manager_approver_id: Option<Uuid>,

    #[sea_orm(nullable)]
    pub task_area_manager_approval_date: Option<DateTime<Utc>>,

    // 総部責任者の承認
    pub head_manager_approved: bool,

    #[sea_orm(nullable)]
    pub head_manager_approver_id: Option<Uuid>,

    #[sea_orm(nullable)]
    pub head_manager_approval_date: Option<DateTime<Utc>>,

    #[sea_orm(nullable, column_type = "Text")]
    pub rejection_reason: Option<String>,

    #[sea_orm(nullable)]
    pub rejected_by: Option<Uuid>,

    #[sea_orm(nullable, column_type = "Text")]
    pub cancellation_reason: Option<String>,

    #[sea_orm(nullable)]
    pub cancellation_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::user_model::Entity",
        from = "Column::ApplicantId",
        to = "crate::domain::user_model::Column::Id",
        on_delete = "Cascade"
    )]
    Applicant,

    #[sea_orm(has_many = "crate::domain::approval_record_model::Entity")]
    ApprovalRecords,
}

impl Related<crate::domain::user_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applicant.def()
    }
}

impl Related<crate::domain::approval_record_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRecords.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            status: Set(LeaveStatus::Draft),
            task_area_manager_approved: Set(false),
            head_manager_approved: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}

impl Model {
    /// 休暇日数（開始日・終了日を含む）
    pub fn duration_days(&self) -> i64 {
        leave_duration_days(self.leave_start_date, self.leave_end_date)
    }

    /// 指定日に休暇中か
    pub fn is_on_leave(&self, today: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved
            && self.leave_start_date <= today
            && today <= self.leave_end_date
    }

    /// 承認済みで未開始の休暇か
    pub fn is_planned_leave(&self, today: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && self.leave_start_date > today
    }

    pub fn current_approval_level(&self) -> Option<ApprovalStage> {
        self.status.approval_stage()
    }

    pub fn is_applicant(&self, user_id: Uuid) -> bool {
        self.applicant_id == user_id
    }
}

pub fn leave_duration_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// 休暇期間の整合性チェック
pub fn validate_leave_period(start: NaiveDate, end: NaiveDate) -> Result<(), String> {
    if end < start {
        return Err(format!(
            "leave_end_date ({}) must not be earlier than leave_start_date ({})",
            end, start
        ));
    }
    Ok(())
}
