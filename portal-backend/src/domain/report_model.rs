// portal-backend/src/domain/report_model.rs

use super::user_role::UserRole;
use super::visibility::OwnerContext;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "report_type")]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[sea_orm(string_value = "weekly")]
    Weekly,

    #[sea_orm(string_value = "monthly")]
    Monthly,

    #[sea_orm(string_value = "summary")]
    Summary,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "report_status")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[sea_orm(string_value = "draft")]
    Draft,

    #[sea_orm(string_value = "submitted")]
    Submitted,

    #[sea_orm(string_value = "reviewed")]
    Reviewed,

    #[sea_orm(string_value = "approved")]
    Approved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Reviewed => "reviewed",
            Self::Approved => "approved",
        }
    }

    pub fn can_be_reviewed(&self) -> bool {
        *self == Self::Submitted
    }

    pub fn can_be_approved(&self) -> bool {
        matches!(self, Self::Submitted | Self::Reviewed)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 業務レポート。(uploader_id, report_type, report_period, task_area_id) は一意。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,

    pub report_type: ReportType,

    pub report_period: String,

    pub uploader_id: Uuid,

    // アップロード時の所属任務区
    pub task_area_id: Uuid,

    pub file_name: String,

    #[sea_orm(nullable, column_type = "Text")]
    pub description: Option<String>,

    pub status: ReportStatus,

    pub is_viewed: bool,

    #[sea_orm(nullable)]
    pub viewed_by: Option<Uuid>,

    #[sea_orm(nullable)]
    pub viewed_at: Option<DateTime<Utc>>,

    #[sea_orm(nullable)]
    pub approver_id: Option<Uuid>,

    #[sea_orm(nullable)]
    pub approved_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::user_model::Entity",
        from = "Column::UploaderId",
        to = "crate::domain::user_model::Column::Id",
        on_delete = "Cascade"
    )]
    Uploader,

    #[sea_orm(
        belongs_to = "crate::domain::task_area_model::Entity",
        from = "Column::TaskAreaId",
        to = "crate::domain::task_area_model::Column::Id"
    )]
    TaskArea,
}

impl Related<crate::domain::user_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uploader.def()
    }
}

impl Related<crate::domain::task_area_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskArea.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            status: Set(ReportStatus::Submitted),
            is_viewed: Set(false),
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
    /// 可視性判定用の所有者情報（所有任務区はレポート自身の任務区）
    pub fn owner_context(&self, uploader_role: UserRole) -> OwnerContext {
        OwnerContext::new(self.uploader_id, uploader_role, Some(self.task_area_id))
    }

    pub fn is_uploader(&self, user_id: Uuid) -> bool {
        self.uploader_id == user_id
    }
}
