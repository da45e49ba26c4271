// src/repository/task_area_repository.rs

use crate::domain::task_area_model::{self, Entity as TaskAreaEntity};
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DbErr, QueryFilter, Set};
use uuid::Uuid;

/// 任務区の取得と作成（接続は呼び出し側のトランザクションを受け取る）
#[derive(Debug, Clone, Copy)]
pub struct TaskAreaRepository;

impl TaskAreaRepository {
    pub async fn find_by_name<C>(
        conn: &C,
        name: &str,
    ) -> Result<Option<task_area_model::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        TaskAreaEntity::find()
            .filter(task_area_model::Column::Name.eq(name))
            .one(conn)
            .await
    }

    /// 名前で取得し、なければ作成する
    ///
    /// `INSERT ... ON CONFLICT (name) DO NOTHING` の後に名前で引き直すため、
    /// 同名の同時作成でも任務区は1件だけになる。
    pub async fn get_or_create<C>(conn: &C, name: &str) -> Result<task_area_model::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let area = task_area_model::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(None),
            created_at: Set(Utc::now()),
        };

        TaskAreaEntity::insert(area)
            .on_conflict(
                OnConflict::column(task_area_model::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Self::find_by_name(conn, name)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("task area '{}'", name)))
    }

    pub async fn find_by_id<C>(conn: &C, id: Uuid) -> Result<Option<task_area_model::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        TaskAreaEntity::find_by_id(id).one(conn).await
    }
}
