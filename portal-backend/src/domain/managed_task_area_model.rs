// portal-backend/src/domain/managed_task_area_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 総部責任者と管轄任務区の関連テーブル
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_managed_task_areas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,

    #[sea_orm(primary_key, auto_increment = false)]
    pub task_area_id: Uuid,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::user_model::Entity",
        from = "Column::UserId",
        to = "crate::domain::user_model::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "crate::domain::task_area_model::Entity",
        from = "Column::TaskAreaId",
        to = "crate::domain::task_area_model::Column::Id",
        on_delete = "Cascade"
    )]
    TaskArea,
}

impl Related<crate::domain::user_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<crate::domain::task_area_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskArea.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
