// tests/integration/alert/visibility_tests.rs
//
// 詳細は範囲外を存在しない扱いにし、対応操作は範囲外を権限エラーにする。

use crate::common::mock_db::*;
use crate::common::*;
use chrono::Utc;
use portal_backend::domain::emergency_alert_model::{self, AlertStatus, AlertType};
use portal_backend::domain::principal::Principal;
use portal_backend::domain::user_model;
use portal_backend::error::ErrorKind;
use portal_backend::service::alert_service::AlertService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

fn active_alert(sender: &Principal) -> emergency_alert_model::Model {
    emergency_alert_model::Model {
        id: Uuid::new_v4(),
        user_id: sender.user_id,
        alert_type: AlertType::Medical,
        latitude: None,
        longitude: None,
        address: "unknown".to_string(),
        message: "emergency alert".to_string(),
        status: AlertStatus::Active,
        handled_by: None,
        handled_at: None,
        resolved_at: None,
        created_at: Utc::now(),
    }
}

// find_with_sender 1回分の結果
fn with_sender(
    alert: &emergency_alert_model::Model,
    sender: &Principal,
) -> Vec<(emergency_alert_model::Model, Option<user_model::Model>)> {
    vec![(alert.clone(), Some(user_row(sender)))]
}

fn service_on(db: &Arc<DatabaseConnection>) -> AlertService {
    AlertService::new(db.clone())
}

#[tokio::test]
async fn alert_detail_follows_the_sender_scope() {
    init_test_env();
    let north = Uuid::new_v4();
    let sender = employee(north);
    let alert = active_alert(&sender);

    let db = Arc::new(
        postgres()
            .append_query_results([with_sender(&alert, &sender)])
            .append_query_results([with_sender(&alert, &sender)])
            .append_query_results([with_sender(&alert, &sender)])
            .into_connection(),
    );
    let service = service_on(&db);

    let seen = service.get(&task_area_manager(north), alert.id).await.unwrap();
    assert_eq!(seen.id, alert.id);

    let own = service.get(&sender, alert.id).await.unwrap();
    assert_eq!(own.user_id, sender.user_id);

    let error = service
        .get(&task_area_manager(Uuid::new_v4()), alert.id)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn handling_outside_scope_is_forbidden_without_a_write() {
    init_test_env();
    let sender = employee(Uuid::new_v4());
    let alert = active_alert(&sender);

    let db = Arc::new(
        postgres()
            .append_query_results([with_sender(&alert, &sender)])
            .append_query_results([with_sender(&alert, &sender)])
            .into_connection(),
    );
    let service = service_on(&db);

    let outsider = task_area_manager(Uuid::new_v4());
    let handle = service.handle(&outsider, alert.id).await.unwrap_err();
    assert_eq!(handle.kind(), ErrorKind::AccessDenied);
    assert!(handle.to_string().contains("outside your scope"));

    // 自分のアラートは見えるが対応はできない
    let own = service.resolve(&sender, alert.id).await.unwrap_err();
    assert_eq!(own.kind(), ErrorKind::AccessDenied);
    assert!(!own.to_string().contains("outside your scope"));

    drop(service);
    let log = shared_sql_log(db);
    assert!(!log.contains(r#"UPDATE \"emergency_alerts\""#));
}
