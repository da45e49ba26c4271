// portal-backend/src/domain/principal.rs

//! リクエストを実行するユーザー（アクター）と、その管轄範囲の表現。
//!
//! すべての権限判定はこの `Principal` を明示的に受け取る。

use super::user_model;
use super::user_role::UserRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// 認証済みアクター
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: UserRole,
    pub task_area_id: Option<Uuid>,
    pub managed_task_areas: BTreeSet<Uuid>,
}

/// アクターが参照・管理できる任務区の範囲
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaScope {
    /// 全任務区（スーパーユーザー）
    All,
    /// 指定された任務区のみ（空集合なら何も見えない）
    Areas(BTreeSet<Uuid>),
}

impl AreaScope {
    pub fn contains(&self, task_area_id: Option<Uuid>) -> bool {
        match self {
            Self::All => true,
            Self::Areas(areas) => task_area_id.is_some_and(|id| areas.contains(&id)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::All => false,
            Self::Areas(areas) => areas.is_empty(),
        }
    }
}

impl Principal {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            task_area_id: None,
            managed_task_areas: BTreeSet::new(),
        }
    }

    pub fn with_task_area(mut self, task_area_id: Uuid) -> Self {
        self.task_area_id = Some(task_area_id);
        self
    }

    pub fn with_managed_task_areas<I>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        self.managed_task_areas = areas.into_iter().collect();
        self
    }

    /// ユーザー行と管轄任務区から構築
    pub fn from_user(user: &user_model::Model, managed_task_areas: Vec<Uuid>) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            task_area_id: user.task_area_id,
            managed_task_areas: managed_task_areas.into_iter().collect(),
        }
    }

    /// 管轄範囲
    ///
    /// 総部責任者は管轄任務区の和集合のみで、未割り当てなら空（fail closed）。
    /// 単一任務区ロールは所属任務区のみ。
    pub fn scope(&self) -> AreaScope {
        match self.role {
            UserRole::Superuser => AreaScope::All,
            UserRole::HeadManager => AreaScope::Areas(self.managed_task_areas.clone()),
            UserRole::TaskAreaManager | UserRole::Employee => {
                AreaScope::Areas(self.task_area_id.into_iter().collect())
            }
        }
    }

    pub fn is_same_user(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// 同じ任務区に所属しているか（どちらかが未所属なら false）
    pub fn shares_task_area(&self, task_area_id: Option<Uuid>) -> bool {
        matches!((self.task_area_id, task_area_id), (Some(a), Some(b)) if a == b)
    }

    pub fn manages_task_area(&self, task_area_id: Option<Uuid>) -> bool {
        task_area_id.is_some_and(|id| self.managed_task_areas.contains(&id))
    }
}
