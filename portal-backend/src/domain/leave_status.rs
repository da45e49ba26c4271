// portal-backend/src/domain/leave_status.rs

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 休暇申請の状態
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_status")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    #[sea_orm(string_value = "draft")]
    Draft,

    #[sea_orm(string_value = "pending_task_area")]
    PendingTaskArea,

    #[sea_orm(string_value = "pending_head")]
    PendingHead,

    #[sea_orm(string_value = "approved")]
    Approved,

    #[sea_orm(string_value = "rejected")]
    Rejected,

    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// 承認段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStage {
    TaskArea,
    Head,
}

impl ApprovalStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskArea => "task_area",
            Self::Head => "head",
        }
    }
}

impl LeaveStatus {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending_task_area" => Some(Self::PendingTaskArea),
            "pending_head" => Some(Self::PendingHead),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingTaskArea => "pending_task_area",
            Self::PendingHead => "pending_head",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Draft,
            Self::PendingTaskArea,
            Self::PendingHead,
            Self::Approved,
            Self::Rejected,
            Self::Cancelled,
        ]
    }

    /// 承認待ちか
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingTaskArea | Self::PendingHead)
    }

    /// 終了状態か（承認済みは取消のみ可能）
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }

    /// 申請者が取り消せる状態か
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Self::PendingTaskArea | Self::PendingHead | Self::Approved
        )
    }

    /// 現在の承認段階
    pub fn approval_stage(&self) -> Option<ApprovalStage> {
        match self {
            Self::PendingTaskArea => Some(ApprovalStage::TaskArea),
            Self::PendingHead => Some(ApprovalStage::Head),
            _ => None,
        }
    }

    /// 主経路 DRAFT → PENDING_TASK_AREA → PENDING_HEAD → APPROVED 上の位置
    pub fn progress_rank(&self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::PendingTaskArea => 1,
            Self::PendingHead => 2,
            Self::Approved | Self::Rejected | Self::Cancelled => 3,
        }
    }

    /// 状態機械で許可された遷移か
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            // 提出（任務区責任者の申請は総部承認へ直行）
            (Self::Draft, Self::PendingTaskArea | Self::PendingHead) => true,

            // 承認
            (Self::PendingTaskArea, Self::PendingHead) => true,
            (Self::PendingHead, Self::Approved) => true,

            // 却下
            (Self::PendingTaskArea | Self::PendingHead, Self::Rejected) => true,

            // 申請者による取消
            (Self::PendingTaskArea | Self::PendingHead | Self::Approved, Self::Cancelled) => true,

            _ => false,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingTaskArea => "Pending Task Area Approval",
            Self::PendingHead => "Pending Head Office Approval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl Default for LeaveStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LeaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s).ok_or_else(|| {
            format!(
                "Invalid leave status: '{}'. Valid statuses are: {}",
                s,
                Self::all()
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}
