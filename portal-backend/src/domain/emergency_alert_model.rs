// portal-backend/src/domain/emergency_alert_model.rs

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, AppResult};

/// 発報から緊急扱いする時間（分）
pub const URGENT_WINDOW_MINUTES: i64 = 5;

pub const DEFAULT_ALERT_ADDRESS: &str = "unknown";
pub const DEFAULT_ALERT_MESSAGE: &str = "emergency alert";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "alert_type")]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    #[sea_orm(string_value = "emergency")]
    Emergency,

    #[sea_orm(string_value = "medical")]
    Medical,

    #[sea_orm(string_value = "security")]
    Security,

    #[sea_orm(string_value = "location")]
    Location,

    #[sea_orm(string_value = "other")]
    Other,
}

impl Default for AlertType {
    fn default() -> Self {
        Self::Emergency
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "alert_status")]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "handled")]
    Handled,

    #[sea_orm(string_value = "resolved")]
    Resolved,

    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Handled => "handled",
            Self::Resolved => "resolved",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "emergency_alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub alert_type: AlertType,

    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    pub address: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub status: AlertStatus,

    #[sea_orm(nullable)]
    pub handled_by: Option<Uuid>,

    #[sea_orm(nullable)]
    pub handled_at: Option<DateTime<Utc>>,

    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTime<Utc>>,

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
    Sender,
}

impl Related<crate::domain::user_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sender.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            alert_type: Set(AlertType::Emergency),
            address: Set(DEFAULT_ALERT_ADDRESS.to_string()),
            message: Set(DEFAULT_ALERT_MESSAGE.to_string()),
            status: Set(AlertStatus::Active),
            created_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl Model {
    /// 発報から一定時間内か
    pub fn is_urgent(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at < Duration::minutes(URGENT_WINDOW_MINUTES)
    }

    pub fn is_sender(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// アラートの状態遷移
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertTransition {
    pub alert_id: Uuid,
    /// 比較交換の期待値
    pub from: AlertStatus,
    pub to: AlertStatus,
    pub handled_by: Option<Uuid>,
    pub handled_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AlertTransition {
    pub fn changes(&self) -> ActiveModel {
        let mut model: ActiveModel = ActiveModelTrait::default();
        model.status = Set(self.to);
        if let Some(handler) = self.handled_by {
            model.handled_by = Set(Some(handler));
            model.handled_at = Set(self.handled_at);
        }
        if self.resolved_at.is_some() {
            model.resolved_at = Set(self.resolved_at);
        }
        model
    }

    pub fn apply_to(&self, alert: &Model) -> Model {
        let mut next = alert.clone();
        next.status = self.to;
        if self.handled_by.is_some() {
            next.handled_by = self.handled_by;
            next.handled_at = self.handled_at;
        }
        if self.resolved_at.is_some() {
            next.resolved_at = self.resolved_at;
        }
        next
    }
}

fn stale_alert(alert: &Model, operation: &str) -> AppError {
    AppError::StateConflict(format!(
        "Alert {} cannot be {} in status '{}'",
        alert.id, operation, alert.status
    ))
}

/// ACTIVE → HANDLED（対応者と対応日時を記録）
pub fn handle(alert: &Model, handler_id: Uuid) -> AppResult<AlertTransition> {
    if alert.status != AlertStatus::Active {
        return Err(stale_alert(alert, "handled"));
    }
    Ok(AlertTransition {
        alert_id: alert.id,
        from: alert.status,
        to: AlertStatus::Handled,
        handled_by: Some(handler_id),
        handled_at: Some(Utc::now()),
        resolved_at: None,
    })
}

/// ACTIVE/HANDLED → RESOLVED（最初の対応者は上書きしない）
pub fn resolve(alert: &Model, handler_id: Uuid) -> AppResult<AlertTransition> {
    let now = Utc::now();
    match alert.status {
        AlertStatus::Active => Ok(AlertTransition {
            alert_id: alert.id,
            from: alert.status,
            to: AlertStatus::Resolved,
            handled_by: Some(handler_id),
            handled_at: Some(now),
            resolved_at: Some(now),
        }),
        AlertStatus::Handled => Ok(AlertTransition {
            alert_id: alert.id,
            from: alert.status,
            to: AlertStatus::Resolved,
            handled_by: None,
            handled_at: None,
            resolved_at: Some(now),
        }),
        AlertStatus::Resolved | AlertStatus::Cancelled => Err(stale_alert(alert, "resolved")),
    }
}

/// 送信者による取消（ACTIVE のみ）
pub fn cancel(alert: &Model, actor_id: Uuid) -> AppResult<AlertTransition> {
    if !alert.is_sender(actor_id) {
        return Err(AppError::Forbidden(
            "Only the sender can cancel an alert".to_string(),
        ));
    }
    if alert.status != AlertStatus::Active {
        return Err(stale_alert(alert, "cancelled"));
    }
    Ok(AlertTransition {
        alert_id: alert.id,
        from: alert.status,
        to: AlertStatus::Cancelled,
        handled_by: None,
        handled_at: None,
        resolved_at: None,
    })
}
