// portal-backend/src/domain/area_assignment.rs

//! ロール変更時の任務区割り当てルール。
//!
//! `plan_assignment` は入力を検証して計画を返すだけで、任務区の作成は
//! 呼び出し側（ロール割り当てサービス）がリポジトリの get-or-create で行う。

use super::task_area_model::{validate_task_area_name, GLOBAL_TASK_AREA_NAME};
use super::user_role::UserRole;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// 任務区の指定方法
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaChoice {
    /// 既存の任務区
    Existing(Uuid),
    /// 名前で指定（存在しなければ作成）
    New(String),
}

/// 呼び出し側から渡される任務区の選択
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSelection {
    #[serde(default)]
    pub task_area: Option<AreaChoice>,
    #[serde(default)]
    pub managed_task_areas: Vec<AreaChoice>,
}

impl AreaSelection {
    pub fn single(choice: AreaChoice) -> Self {
        Self {
            task_area: Some(choice),
            managed_task_areas: Vec::new(),
        }
    }

    pub fn managed<I>(choices: I) -> Self
    where
        I: IntoIterator<Item = AreaChoice>,
    {
        Self {
            task_area: None,
            managed_task_areas: choices.into_iter().collect(),
        }
    }
}

/// 検証済みの割り当て計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentPlan {
    /// スーパーユーザー: 管轄任務区をクリアし、"global" 任務区に所属
    Global,
    /// 総部責任者: 単一任務区をクリアし、管轄任務区を丸ごと置き換える
    Managed(Vec<AreaChoice>),
    /// 任務区責任者・従業員: 管轄任務区をクリアし、任務区を1つだけ持つ
    Single(AreaChoice),
}

/// 任務区IDまで解決済みの割り当て
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssignment {
    pub role: UserRole,
    pub task_area_id: Option<Uuid>,
    pub managed_task_areas: BTreeSet<Uuid>,
}

impl ResolvedAssignment {
    pub fn global(global_area_id: Uuid) -> Self {
        Self {
            role: UserRole::Superuser,
            task_area_id: Some(global_area_id),
            managed_task_areas: BTreeSet::new(),
        }
    }

    pub fn managed(areas: BTreeSet<Uuid>) -> AppResult<Self> {
        if areas.is_empty() {
            return Err(AppError::ValidationError(
                "A head manager must manage at least one task area".to_string(),
            ));
        }
        Ok(Self {
            role: UserRole::HeadManager,
            task_area_id: None,
            managed_task_areas: areas,
        })
    }

    pub fn single(role: UserRole, task_area_id: Uuid) -> Self {
        Self {
            role,
            task_area_id: Some(task_area_id),
            managed_task_areas: BTreeSet::new(),
        }
    }
}

// "global" はスーパーユーザー専用。既存IDで指定された場合は解決時に弾く
fn normalize_choice(choice: AreaChoice) -> AppResult<AreaChoice> {
    match choice {
        AreaChoice::Existing(id) => Ok(AreaChoice::Existing(id)),
        AreaChoice::New(name) => {
            let name = validate_task_area_name(&name).map_err(AppError::ValidationError)?;
            if name.eq_ignore_ascii_case(GLOBAL_TASK_AREA_NAME) {
                return Err(AppError::ValidationError(format!(
                    "Task area '{}' is reserved for superusers",
                    GLOBAL_TASK_AREA_NAME
                )));
            }
            Ok(AreaChoice::New(name))
        }
    }
}

/// ロールと任務区の選択から割り当て計画を作る
pub fn plan_assignment(role: UserRole, selection: AreaSelection) -> AppResult<AssignmentPlan> {
    match role {
        UserRole::Superuser => Ok(AssignmentPlan::Global),
        UserRole::HeadManager => {
            let mut errors = Vec::new();
            let mut areas: Vec<AreaChoice> = Vec::new();
            for choice in selection.managed_task_areas {
                match normalize_choice(choice) {
                    Ok(choice) if !areas.contains(&choice) => areas.push(choice),
                    Ok(_) => {}
                    Err(AppError::ValidationError(message)) => {
                        errors.push(format!("managed_task_areas: {}", message))
                    }
                    Err(other) => return Err(other),
                }
            }

            if !errors.is_empty() {
                return Err(AppError::ValidationErrors(errors));
            }
            if areas.is_empty() {
                return Err(AppError::ValidationError(
                    "A head manager must manage at least one task area".to_string(),
                ));
            }
            Ok(AssignmentPlan::Managed(areas))
        }
        UserRole::TaskAreaManager | UserRole::Employee => {
            let choice = selection.task_area.ok_or_else(|| {
                AppError::ValidationError(format!(
                    "Role '{}' requires exactly one task area",
                    role
                ))
            })?;
            Ok(AssignmentPlan::Single(normalize_choice(choice)?))
        }
    }
}
