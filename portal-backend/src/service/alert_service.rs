// portal-backend/src/service/alert_service.rs

use crate::domain::emergency_alert_model::{
    self, AlertStatus, AlertTransition, AlertType, DEFAULT_ALERT_ADDRESS, DEFAULT_ALERT_MESSAGE,
};
use crate::domain::principal::Principal;
use crate::domain::user_model::validate_coordinates;
use crate::domain::visibility::{visibility_filter, ResourceKind};
use crate::error::{AppError, AppResult};
use crate::repository::emergency_alert_repository::{AlertWithSender, EmergencyAlertRepository};
use crate::utils::permission::PermissionChecker;
use crate::utils::transaction::run_atomic;
use sea_orm::{ActiveModelBehavior, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 発報内容（未指定の項目は既定値になる）
#[derive(Debug, Clone, Default)]
pub struct NewAlert {
    pub alert_type: Option<AlertType>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub message: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub struct AlertService {
    db: Arc<DatabaseConnection>,
    alert_repository: EmergencyAlertRepository,
}

impl AlertService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            alert_repository: EmergencyAlertRepository::new(db.clone()),
            db,
        }
    }

    /// 緊急アラートを発報（全ロール可）
    pub async fn create(
        &self,
        actor: &Principal,
        alert: NewAlert,
    ) -> AppResult<emergency_alert_model::Model> {
        match (alert.latitude, alert.longitude) {
            (Some(lat), Some(lon)) => {
                validate_coordinates(lat, lon).map_err(AppError::ValidationError)?
            }
            (None, None) => {}
            _ => {
                return Err(AppError::ValidationError(
                    "location: latitude and longitude must be given together".to_string(),
                ))
            }
        }

        let mut model = <emergency_alert_model::ActiveModel as ActiveModelBehavior>::new();
        model.user_id = Set(actor.user_id);
        model.alert_type = Set(alert.alert_type.unwrap_or_default());
        model.latitude = Set(alert.latitude);
        model.longitude = Set(alert.longitude);
        model.address =
            Set(non_blank(alert.address).unwrap_or_else(|| DEFAULT_ALERT_ADDRESS.to_string()));
        model.message =
            Set(non_blank(alert.message).unwrap_or_else(|| DEFAULT_ALERT_MESSAGE.to_string()));

        let created = self.alert_repository.insert(model).await?;

        warn!(
            alert_id = %created.id,
            sender_id = %created.user_id,
            alert_type = ?created.alert_type,
            "Emergency alert raised"
        );
        Ok(created)
    }

    pub async fn list(
        &self,
        actor: &Principal,
        status: Option<AlertStatus>,
    ) -> AppResult<Vec<AlertWithSender>> {
        let filter = visibility_filter(actor, ResourceKind::EmergencyAlert);
        let rows = self.alert_repository.find_visible(&filter, status).await?;
        let visible = filter.apply(rows);
        debug!(user_id = %actor.user_id, count = visible.len(), "Listed alerts");
        Ok(visible)
    }

    /// アラート詳細（範囲外は存在しない扱い）
    pub async fn get(&self, actor: &Principal, id: Uuid) -> AppResult<emergency_alert_model::Model> {
        let not_found = || AppError::NotFound(format!("Alert {} not found", id));
        let (alert, sender) = self
            .alert_repository
            .find_with_sender(id)
            .await?
            .ok_or_else(not_found)?;

        if !PermissionChecker::can_view_alert(actor, &sender) {
            debug!(user_id = %actor.user_id, alert_id = %id, "Alert outside scope");
            return Err(not_found());
        }
        Ok(alert)
    }

    /// ACTIVE → HANDLED
    pub async fn handle(&self, actor: &Principal, id: Uuid) -> AppResult<emergency_alert_model::Model> {
        let alert = self.find_for_handling(actor, id).await?;
        let transition = emergency_alert_model::handle(&alert, actor.user_id)?;
        self.commit_transition(alert, transition).await
    }

    /// ACTIVE/HANDLED → RESOLVED
    pub async fn resolve(
        &self,
        actor: &Principal,
        id: Uuid,
    ) -> AppResult<emergency_alert_model::Model> {
        let alert = self.find_for_handling(actor, id).await?;
        let transition = emergency_alert_model::resolve(&alert, actor.user_id)?;
        self.commit_transition(alert, transition).await
    }

    /// 発報者による取消
    pub async fn cancel(&self, actor: &Principal, id: Uuid) -> AppResult<emergency_alert_model::Model> {
        let (alert, _) = self
            .alert_repository
            .find_with_sender(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Alert {} not found", id)))?;
        let transition = emergency_alert_model::cancel(&alert, actor.user_id).inspect_err(|_| {
            warn!(user_id = %actor.user_id, alert_id = %id, "Alert cancellation rejected")
        })?;
        self.commit_transition(alert, transition).await
    }

    async fn find_for_handling(
        &self,
        actor: &Principal,
        id: Uuid,
    ) -> AppResult<emergency_alert_model::Model> {
        let (alert, sender) = self
            .alert_repository
            .find_with_sender(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Alert {} not found", id)))?;

        if !PermissionChecker::can_view_alert(actor, &sender) {
            warn!(user_id = %actor.user_id, alert_id = %id, "Alert outside scope");
            return Err(AppError::Forbidden(format!(
                "Alert {} is outside your scope",
                id
            )));
        }
        if !PermissionChecker::can_handle_alert(actor, &sender) {
            warn!(
                user_id = %actor.user_id,
                role = %actor.role,
                alert_id = %id,
                "Alert handling denied"
            );
            return Err(AppError::Forbidden(format!(
                "You cannot handle alert {}",
                id
            )));
        }
        Ok(alert)
    }

    async fn commit_transition(
        &self,
        alert: emergency_alert_model::Model,
        transition: AlertTransition,
    ) -> AppResult<emergency_alert_model::Model> {
        let pending = transition.clone();
        run_atomic(&self.db, "alert_transition", move |txn| {
            Box::pin(async move { EmergencyAlertRepository::apply_transition(txn, &pending).await })
        })
        .await
        .inspect_err(|e| {
            if e.is_state_conflict() {
                warn!(
                    alert_id = %transition.alert_id,
                    expected = %transition.from,
                    "Alert transition lost a concurrent update"
                );
            }
        })?;

        info!(
            alert_id = %transition.alert_id,
            from = %transition.from,
            to = %transition.to,
            handled_by = ?transition.handled_by,
            "Alert transitioned"
        );
        Ok(transition.apply_to(&alert))
    }
}
