// src/repository/user_repository.rs

use crate::domain::area_assignment::ResolvedAssignment;
use crate::domain::managed_task_area_model::{self, Entity as ManagedTaskAreaEntity};
use crate::domain::principal::Principal;
use crate::domain::user_model::{self, Entity as UserEntity};
use crate::domain::visibility::{OwnerColumns, VisibilityFilter};
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::{ConnectionTrait, DbConn, DbErr, Order, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Arc<DbConn>,
}

/// ユーザー表の所有者列
fn owner_columns() -> OwnerColumns<user_model::Column, user_model::Column, user_model::Column> {
    OwnerColumns {
        owner_id: user_model::Column::Id,
        owner_role: user_model::Column::Role,
        owner_task_area: user_model::Column::TaskAreaId,
    }
}

impl UserRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }

    /// ユーザーをIDで検索
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user_model::Model>, DbErr> {
        UserEntity::find_by_id(id).one(self.db.as_ref()).await
    }

    /// 管轄任務区のID一覧
    pub async fn managed_area_ids<C>(conn: &C, user_id: Uuid) -> Result<Vec<Uuid>, DbErr>
    where
        C: ConnectionTrait,
    {
        let rows = ManagedTaskAreaEntity::find()
            .filter(managed_task_area_model::Column::UserId.eq(user_id))
            .all(conn)
            .await?;
        Ok(rows.into_iter().map(|r| r.task_area_id).collect())
    }

    /// ユーザーと管轄任務区からアクターを構築
    pub async fn find_principal(
        &self,
        id: Uuid,
    ) -> Result<Option<(user_model::Model, Principal)>, DbErr> {
        let Some(user) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let managed = Self::managed_area_ids(self.db.as_ref(), user.id).await?;
        let principal = Principal::from_user(&user, managed);
        Ok(Some((user, principal)))
    }

    /// 可視範囲内のユーザー一覧（作成日時の降順）
    pub async fn find_visible(
        &self,
        filter: &VisibilityFilter,
    ) -> Result<Vec<user_model::Model>, DbErr> {
        UserEntity::find()
            .filter(filter.condition(&owner_columns()))
            .order_by(user_model::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
    }

    /// 可視範囲内で位置情報を持つユーザー
    pub async fn find_visible_with_location(
        &self,
        filter: &VisibilityFilter,
    ) -> Result<Vec<user_model::Model>, DbErr> {
        UserEntity::find()
            .filter(filter.condition(&owner_columns()))
            .filter(user_model::Column::Latitude.is_not_null())
            .filter(user_model::Column::Longitude.is_not_null())
            .order_by(user_model::Column::LocationUpdatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
    }

    /// ロール・任務区の割り当てを書き込む
    ///
    /// 管轄任務区は差分ではなく全削除と再登録で置き換える。
    /// 呼び出し側のトランザクション内で実行すること。
    pub async fn apply_assignment<C>(
        conn: &C,
        user_id: Uuid,
        assignment: &ResolvedAssignment,
    ) -> Result<user_model::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut changes: user_model::ActiveModel = ActiveModelTrait::default();
        changes.role = Set(assignment.role);
        changes.task_area_id = Set(assignment.task_area_id);
        changes.updated_at = Set(Utc::now());

        let result = UserEntity::update_many()
            .set(changes)
            .filter(user_model::Column::Id.eq(user_id))
            .exec(conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("user {}", user_id)));
        }

        ManagedTaskAreaEntity::delete_many()
            .filter(managed_task_area_model::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;
        Self::insert_managed_areas(conn, user_id, assignment).await?;

        UserEntity::find_by_id(user_id)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {}", user_id)))
    }

    pub async fn find_by_username<C>(
        conn: &C,
        username: &str,
    ) -> Result<Option<user_model::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        UserEntity::find()
            .filter(user_model::Column::Username.eq(username))
            .one(conn)
            .await
    }

    /// 割り当て済みの状態でユーザーを作成する
    ///
    /// 呼び出し側のトランザクション内で実行すること。
    pub async fn create_with_assignment<C>(
        conn: &C,
        username: &str,
        full_name: &str,
        assignment: &ResolvedAssignment,
    ) -> Result<user_model::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut model = <user_model::ActiveModel as ActiveModelBehavior>::new();
        model.username = Set(username.to_string());
        model.full_name = Set(full_name.to_string());
        model.role = Set(assignment.role);
        model.task_area_id = Set(assignment.task_area_id);

        let created = model.insert(conn).await?;
        Self::insert_managed_areas(conn, created.id, assignment).await?;
        Ok(created)
    }

    async fn insert_managed_areas<C>(
        conn: &C,
        user_id: Uuid,
        assignment: &ResolvedAssignment,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        if assignment.managed_task_areas.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let rows = assignment
            .managed_task_areas
            .iter()
            .map(|area_id| managed_task_area_model::ActiveModel {
                user_id: Set(user_id),
                task_area_id: Set(*area_id),
                created_at: Set(now),
            });
        ManagedTaskAreaEntity::insert_many(rows)
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// 有効なユーザーを無効化する。対象が既に無効なら false
    pub async fn deactivate(&self, user_id: Uuid) -> Result<bool, DbErr> {
        let mut changes: user_model::ActiveModel = ActiveModelTrait::default();
        changes.is_active = Set(false);
        changes.updated_at = Set(Utc::now());

        let result = UserEntity::update_many()
            .set(changes)
            .filter(user_model::Column::Id.eq(user_id))
            .filter(user_model::Column::IsActive.eq(true))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// 位置情報の更新
    pub async fn update_location(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
        address: Option<String>,
    ) -> Result<Option<user_model::Model>, DbErr> {
        let Some(user) = self.find_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active_model: user_model::ActiveModel = user.into();
        active_model.latitude = Set(Some(latitude));
        active_model.longitude = Set(Some(longitude));
        active_model.location_address = Set(address);
        active_model.location_updated_at = Set(Some(Utc::now()));

        let updated = active_model.update(self.db.as_ref()).await?;
        Ok(Some(updated))
    }
}
