// portal-backend/src/domain/user_role.rs

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ユーザーロール
///
/// 権限の強さは `Employee < TaskAreaManager < HeadManager < Superuser` の順。
/// ただし管轄範囲は継承ではなく、任務区の割り当てによって決まる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "employee")]
    Employee,

    #[sea_orm(string_value = "task_area_manager")]
    TaskAreaManager,

    #[sea_orm(string_value = "head_manager")]
    HeadManager,

    #[sea_orm(string_value = "superuser")]
    Superuser,
}

impl UserRole {
    /// 文字列からロールを解析
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "task_area_manager" => Some(Self::TaskAreaManager),
            "head_manager" => Some(Self::HeadManager),
            "superuser" => Some(Self::Superuser),
            _ => None,
        }
    }

    /// ロール名を文字列として取得
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::TaskAreaManager => "task_area_manager",
            Self::HeadManager => "head_manager",
            Self::Superuser => "superuser",
        }
    }

    /// すべてのロール（権限の弱い順）
    pub fn all() -> Vec<Self> {
        vec![
            Self::Employee,
            Self::TaskAreaManager,
            Self::HeadManager,
            Self::Superuser,
        ]
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self, Self::Superuser)
    }

    pub fn is_head_manager(&self) -> bool {
        matches!(self, Self::HeadManager)
    }

    pub fn is_employee(&self) -> bool {
        matches!(self, Self::Employee)
    }

    /// 休暇申請に承認が必要なロールか（＝休暇申請を出せるロール）
    pub fn needs_leave_approval(&self) -> bool {
        matches!(self, Self::Employee | Self::TaskAreaManager)
    }

    /// 管理系の画面・一覧にアクセスできるか
    pub fn is_manager_or_above(&self) -> bool {
        !self.is_employee()
    }

    /// 表示名
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Employee => "Employee",
            Self::TaskAreaManager => "Task Area Manager",
            Self::HeadManager => "Head Manager",
            Self::Superuser => "Superuser",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Employee
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s).ok_or_else(|| {
            format!(
                "Invalid role: '{}'. Valid roles are: {}",
                s,
                Self::all()
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}
