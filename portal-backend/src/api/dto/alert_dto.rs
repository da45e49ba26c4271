// src/api/dto/alert_dto.rs
use crate::domain::emergency_alert_model::{self, AlertStatus, AlertType};
use crate::service::alert_service::NewAlert;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const ADDRESS_MAX_LENGTH: u64 = 200;
pub const MESSAGE_MAX_LENGTH: u64 = 1000;

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
pub struct CreateAlertRequest {
    pub alert_type: Option<AlertType>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within [-90, 90]"))]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be within [-180, 180]"
    ))]
    pub longitude: Option<f64>,

    #[validate(length(max = ADDRESS_MAX_LENGTH, message = "Address must not exceed 200 characters"))]
    pub address: Option<String>,

    #[validate(length(max = MESSAGE_MAX_LENGTH, message = "Message must not exceed 1000 characters"))]
    pub message: Option<String>,
}

impl From<CreateAlertRequest> for NewAlert {
    fn from(request: CreateAlertRequest) -> Self {
        Self {
            alert_type: request.alert_type,
            latitude: request.latitude,
            longitude: request.longitude,
            address: request.address,
            message: request.message,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct AlertListQuery {
    pub status: Option<AlertStatus>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AlertResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub alert_type: AlertType,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: String,
    pub message: String,
    pub status: AlertStatus,
    pub is_urgent: bool,
    pub handled_by: Option<Uuid>,
    pub handled_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AlertResponse {
    pub fn at(model: emergency_alert_model::Model, now: DateTime<Utc>) -> Self {
        Self {
            is_urgent: model.is_urgent(now),
            id: model.id,
            user_id: model.user_id,
            alert_type: model.alert_type,
            latitude: model.latitude,
            longitude: model.longitude,
            address: model.address,
            message: model.message,
            status: model.status,
            handled_by: model.handled_by,
            handled_at: model.handled_at,
            resolved_at: model.resolved_at,
            created_at: model.created_at,
        }
    }
}

impl From<emergency_alert_model::Model> for AlertResponse {
    fn from(model: emergency_alert_model::Model) -> Self {
        Self::at(model, Utc::now())
    }
}
