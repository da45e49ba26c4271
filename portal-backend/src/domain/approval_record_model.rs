// portal-backend/src/domain/approval_record_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 承認履歴のアクション
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_action")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    #[sea_orm(string_value = "submitted")]
    Submitted,

    #[sea_orm(string_value = "approved")]
    Approved,

    #[sea_orm(string_value = "rejected")]
    Rejected,

    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 休暇申請の監査ログ（追記のみ）
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub leave_application_id: Uuid,

    pub approver_id: Uuid,

    pub action: ApprovalAction,

    #[sea_orm(nullable, column_type = "Text")]
    pub comment: Option<String>,

    pub approval_date: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::leave_application_model::Entity",
        from = "Column::LeaveApplicationId",
        to = "crate::domain::leave_application_model::Column::Id",
        on_delete = "Cascade"
    )]
    LeaveApplication,
}

impl Related<crate::domain::leave_application_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveApplication.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            approval_date: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}
