// portal-backend/src/domain/user_model.rs

use super::user_role::UserRole;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub username: String,

    pub full_name: String,

    pub role: UserRole,

    // 従業員・任務区責任者の所属任務区（総部責任者は未使用）
    #[sea_orm(nullable)]
    pub task_area_id: Option<Uuid>,

    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    #[sea_orm(nullable)]
    pub location_address: Option<String>,

    #[sea_orm(nullable)]
    pub location_updated_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::task_area_model::Entity",
        from = "Column::TaskAreaId",
        to = "crate::domain::task_area_model::Column::Id"
    )]
    TaskArea,

    #[sea_orm(has_many = "crate::domain::managed_task_area_model::Entity")]
    ManagedTaskAreas,

    #[sea_orm(has_many = "crate::domain::leave_application_model::Entity")]
    LeaveApplications,
}

impl Related<crate::domain::task_area_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskArea.def()
    }
}

impl Related<crate::domain::managed_task_area_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManagedTaskAreas.def()
    }
}

impl Related<crate::domain::leave_application_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveApplications.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            is_active: Set(true),
            role: Set(UserRole::Employee),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            // 更新の場合のみ updated_at を更新
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}

/// 位置情報の座標範囲チェック
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude out of range: {}", latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude out of range: {}", longitude));
    }
    Ok(())
}
