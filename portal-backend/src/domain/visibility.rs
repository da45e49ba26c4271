// portal-backend/src/domain/visibility.rs

//! ロール別の可視範囲フィルタ。
//!
//! 一覧の絞り込み（`apply` / `condition`）と詳細の参照可否（`matches`）は
//! 同じ `VisibilityRule` から導出されるため、両者の判定は一致する。

use super::principal::Principal;
use super::user_model;
use super::user_role::UserRole;
use sea_orm::{ColumnTrait, Condition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// 可視性フィルタの対象リソース種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    LeaveApplication,
    Report,
    EmergencyAlert,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::LeaveApplication => "leave_application",
            Self::Report => "report",
            Self::EmergencyAlert => "emergency_alert",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// リソース所有者の情報（ユーザー本人・申請者・アップロード者・送信者）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerContext {
    pub owner_id: Uuid,
    pub owner_role: UserRole,
    pub owner_task_area_id: Option<Uuid>,
}

impl OwnerContext {
    pub fn new(owner_id: Uuid, owner_role: UserRole, owner_task_area_id: Option<Uuid>) -> Self {
        Self {
            owner_id,
            owner_role,
            owner_task_area_id,
        }
    }

    pub fn of_user(user: &user_model::Model) -> Self {
        Self::new(user.id, user.role, user.task_area_id)
    }
}

/// 所有者を持つリソース
pub trait ScopedResource {
    fn owner(&self) -> OwnerContext;
}

impl ScopedResource for OwnerContext {
    fn owner(&self) -> OwnerContext {
        *self
    }
}

impl ScopedResource for user_model::Model {
    fn owner(&self) -> OwnerContext {
        OwnerContext::of_user(self)
    }
}

impl ScopedResource for Principal {
    fn owner(&self) -> OwnerContext {
        OwnerContext::new(self.user_id, self.role, self.task_area_id)
    }
}

/// 結合済みの所有者情報を伴うレコード
impl<T> ScopedResource for (T, OwnerContext) {
    fn owner(&self) -> OwnerContext {
        self.1
    }
}

/// ロールごとの可視範囲ルール。どのルールでもアクター自身のレコードは見える。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityRule {
    /// スーパーユーザー: 制限なし
    Unrestricted,
    /// 総部責任者: 所有者の任務区が管轄任務区に含まれる
    OwnerAreaIn {
        actor_id: Uuid,
        task_areas: BTreeSet<Uuid>,
    },
    /// 任務区責任者: 同じ任務区の従業員
    EmployeesOfArea {
        actor_id: Uuid,
        task_area_id: Option<Uuid>,
    },
    /// 従業員: 自分のみ
    OwnOnly { actor_id: Uuid },
}

impl VisibilityRule {
    pub fn for_principal(actor: &Principal) -> Self {
        match actor.role {
            UserRole::Superuser => Self::Unrestricted,
            UserRole::HeadManager => Self::OwnerAreaIn {
                actor_id: actor.user_id,
                task_areas: actor.managed_task_areas.clone(),
            },
            UserRole::TaskAreaManager => Self::EmployeesOfArea {
                actor_id: actor.user_id,
                task_area_id: actor.task_area_id,
            },
            UserRole::Employee => Self::OwnOnly {
                actor_id: actor.user_id,
            },
        }
    }

    pub fn matches(&self, owner: &OwnerContext) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::OwnerAreaIn {
                actor_id,
                task_areas,
            } => {
                owner.owner_id == *actor_id
                    || owner
                        .owner_task_area_id
                        .is_some_and(|area| task_areas.contains(&area))
            }
            Self::EmployeesOfArea {
                actor_id,
                task_area_id,
            } => {
                owner.owner_id == *actor_id
                    || (owner.owner_role == UserRole::Employee
                        && task_area_id.is_some()
                        && owner.owner_task_area_id == *task_area_id)
            }
            Self::OwnOnly { actor_id } => owner.owner_id == *actor_id,
        }
    }
}

/// 所有者列のマッピング（ユーザー表やJOIN済みのリソース表の列）
pub struct OwnerColumns<O, R, A> {
    pub owner_id: O,
    pub owner_role: R,
    pub owner_task_area: A,
}

/// リソース種別ごとの可視性フィルタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
    pub kind: ResourceKind,
    pub rule: VisibilityRule,
}

impl VisibilityFilter {
    pub fn new(actor: &Principal, kind: ResourceKind) -> Self {
        Self {
            kind,
            rule: VisibilityRule::for_principal(actor),
        }
    }

    /// 単一レコードの参照可否
    pub fn matches<R: ScopedResource + ?Sized>(&self, resource: &R) -> bool {
        self.rule.matches(&resource.owner())
    }

    /// 取得済みのコレクションを絞り込む
    pub fn apply<R, I>(&self, resources: I) -> Vec<R>
    where
        R: ScopedResource,
        I: IntoIterator<Item = R>,
    {
        resources.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// 一覧クエリ用の条件へ変換
    pub fn condition<O, R, A>(&self, columns: &OwnerColumns<O, R, A>) -> Condition
    where
        O: ColumnTrait,
        R: ColumnTrait,
        A: ColumnTrait,
    {
        match &self.rule {
            VisibilityRule::Unrestricted => Condition::all(),
            VisibilityRule::OwnerAreaIn {
                actor_id,
                task_areas,
            } => {
                let mut condition = Condition::any().add(columns.owner_id.eq(*actor_id));
                if !task_areas.is_empty() {
                    condition = condition.add(
                        columns
                            .owner_task_area
                            .is_in(task_areas.iter().copied().collect::<Vec<_>>()),
                    );
                }
                condition
            }
            VisibilityRule::EmployeesOfArea {
                actor_id,
                task_area_id,
            } => {
                let mut condition = Condition::any().add(columns.owner_id.eq(*actor_id));
                if let Some(area) = task_area_id {
                    condition = condition.add(
                        Condition::all()
                            .add(columns.owner_task_area.eq(*area))
                            .add(columns.owner_role.eq(UserRole::Employee)),
                    );
                }
                condition
            }
            VisibilityRule::OwnOnly { actor_id } => {
                Condition::all().add(columns.owner_id.eq(*actor_id))
            }
        }
    }
}

/// アクターとリソース種別から可視性フィルタを生成
pub fn visibility_filter(actor: &Principal, kind: ResourceKind) -> VisibilityFilter {
    VisibilityFilter::new(actor, kind)
}
