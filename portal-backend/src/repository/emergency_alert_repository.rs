// src/repository/emergency_alert_repository.rs

use crate::domain::emergency_alert_model::{
    self, AlertStatus, AlertTransition, Entity as EmergencyAlertEntity,
};
use crate::domain::user_model::{self, Entity as UserEntity};
use crate::domain::visibility::{OwnerColumns, OwnerContext, VisibilityFilter};
use crate::error::{AppError, AppResult};
use sea_orm::entity::*;
use sea_orm::{ConnectionTrait, DbConn, DbErr, Order, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

pub type AlertWithSender = (emergency_alert_model::Model, OwnerContext);

#[derive(Debug, Clone)]
pub struct EmergencyAlertRepository {
    db: Arc<DbConn>,
}

fn sender_columns(
) -> OwnerColumns<emergency_alert_model::Column, user_model::Column, user_model::Column> {
    OwnerColumns {
        owner_id: emergency_alert_model::Column::UserId,
        owner_role: user_model::Column::Role,
        owner_task_area: user_model::Column::TaskAreaId,
    }
}

fn attach_sender(
    rows: Vec<(emergency_alert_model::Model, Option<user_model::Model>)>,
) -> Vec<AlertWithSender> {
    rows.into_iter()
        .filter_map(|(alert, sender)| sender.map(|u| (alert, OwnerContext::of_user(&u))))
        .collect()
}

impl EmergencyAlertRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }

    pub async fn insert(
        &self,
        model: emergency_alert_model::ActiveModel,
    ) -> Result<emergency_alert_model::Model, DbErr> {
        model.insert(self.db.as_ref()).await
    }

    pub async fn find_with_sender(&self, id: Uuid) -> Result<Option<AlertWithSender>, DbErr> {
        let row = EmergencyAlertEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(self.db.as_ref())
            .await?;
        Ok(attach_sender(row.into_iter().collect()).into_iter().next())
    }

    /// 可視範囲内のアラート一覧（新しい順）
    pub async fn find_visible(
        &self,
        filter: &VisibilityFilter,
        status: Option<AlertStatus>,
    ) -> Result<Vec<AlertWithSender>, DbErr> {
        let mut query = EmergencyAlertEntity::find()
            .find_also_related(UserEntity)
            .filter(filter.condition(&sender_columns()));
        if let Some(status) = status {
            query = query.filter(emergency_alert_model::Column::Status.eq(status));
        }
        let rows = query
            .order_by(emergency_alert_model::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await?;
        Ok(attach_sender(rows))
    }

    /// 状態遷移を比較交換で適用（対応者は一度だけ書き込まれる）
    pub async fn apply_transition<C>(conn: &C, transition: &AlertTransition) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = EmergencyAlertEntity::update_many()
            .set(transition.changes())
            .filter(emergency_alert_model::Column::Id.eq(transition.alert_id))
            .filter(emergency_alert_model::Column::Status.eq(transition.from))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::StateConflict(format!(
                "Alert {} was changed by someone else (expected status '{}')",
                transition.alert_id, transition.from
            )));
        }
        Ok(())
    }
}
