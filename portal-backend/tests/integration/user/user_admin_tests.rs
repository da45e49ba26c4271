// tests/integration/user/user_admin_tests.rs
//
// ユーザー作成と無効化。作成はロール割り当てと同じ規則で、1トランザクションで行う。

use crate::common::mock_db::*;
use crate::common::*;
use portal_backend::domain::area_assignment::{AreaChoice, AreaSelection};
use portal_backend::domain::principal::Principal;
use portal_backend::domain::task_area_model;
use portal_backend::domain::user_model;
use portal_backend::domain::user_role::UserRole;
use portal_backend::error::ErrorKind;
use portal_backend::service::user_service::{NewUser, UserService};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        full_name: "Amani Lado".to_string(),
    }
}

/// 作成後にデータベースが返すユーザー行
fn created_row(principal: &Principal, username: &str) -> user_model::Model {
    user_model::Model {
        username: username.to_string(),
        full_name: "Amani Lado".to_string(),
        ..user_row(principal)
    }
}

fn service_on(db: &Arc<DatabaseConnection>) -> UserService {
    UserService::new(db.clone())
}

#[tokio::test]
async fn head_manager_creates_an_employee_in_a_managed_area() {
    init_test_env();
    let north = Uuid::new_v4();
    let actor = head_manager([north]);
    let expected = created_row(&employee(north), "amani.lado");
    let area = task_area_model::Model {
        id: north,
        ..task_area("North")
    };

    let db = Arc::new(
        postgres()
            .append_query_results([Vec::<user_model::Model>::new()])
            .append_query_results([vec![area]])
            .append_query_results([vec![expected.clone()]])
            .into_connection(),
    );
    let service = service_on(&db);

    let created = service
        .create_user(
            &actor,
            new_user("  amani.lado "),
            UserRole::Employee,
            AreaSelection::single(AreaChoice::Existing(north)),
        )
        .await
        .unwrap();
    assert_eq!(created.id, expected.id);
    assert_eq!(created.task_area_id, Some(north));

    drop(service);
    let log = shared_sql_log(db);
    assert_eq!(occurrences(&log, INSERT_USER), 1);
    assert_eq!(occurrences(&log, INSERT_MANAGED_AREA), 0);
    assert!(log.contains("COMMIT"));
    // 前後の空白は取り除いて保存する
    assert!(log.contains(r#""amani.lado""#));
}

#[tokio::test]
async fn superuser_creates_a_head_manager_with_managed_areas() {
    init_test_env();
    let east = task_area("East");
    let west = task_area("West");
    let manager = head_manager([east.id, west.id]);
    let expected = user_model::Model {
        task_area_id: None,
        ..created_row(&manager, "east.west")
    };

    let db = Arc::new(
        postgres()
            .append_query_results([Vec::<user_model::Model>::new()])
            .append_exec_results([rows(1)])
            .append_query_results([vec![east.clone()]])
            .append_query_results([vec![west.clone()]])
            .append_query_results([vec![expected.clone()]])
            .append_exec_results([rows(2)])
            .into_connection(),
    );
    let service = service_on(&db);

    let created = service
        .create_user(
            &superuser(),
            new_user("east.west"),
            UserRole::HeadManager,
            AreaSelection::managed([
                AreaChoice::New("East".to_string()),
                AreaChoice::Existing(west.id),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(created.role, UserRole::HeadManager);

    drop(service);
    let log = shared_sql_log(db);
    assert_eq!(occurrences(&log, INSERT_TASK_AREA), 1);
    assert_eq!(occurrences(&log, INSERT_USER), 1);
    assert_eq!(occurrences(&log, INSERT_MANAGED_AREA), 1);
}

#[tokio::test]
async fn role_outside_the_actor_grant_is_forbidden_before_any_query() {
    init_test_env();
    let north = Uuid::new_v4();

    let db = Arc::new(postgres().into_connection());
    let service = service_on(&db);

    for (actor, role) in [
        (head_manager([north]), UserRole::HeadManager),
        (head_manager([north]), UserRole::Superuser),
        (task_area_manager(north), UserRole::TaskAreaManager),
        (employee(north), UserRole::Employee),
    ] {
        let error = service
            .create_user(
                &actor,
                new_user("someone"),
                role,
                AreaSelection::single(AreaChoice::Existing(north)),
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessDenied, "{} granting {}", actor.role, role);
    }

    drop(service);
    assert_eq!(shared_sql_log(db), "[]");
}

#[tokio::test]
async fn out_of_scope_area_rolls_back_the_creation() {
    init_test_env();
    let north = Uuid::new_v4();
    let actor = head_manager([north]);

    let db = Arc::new(
        postgres()
            .append_query_results([Vec::<user_model::Model>::new()])
            .append_exec_results([rows(1)])
            .append_query_results([vec![task_area("South")]])
            .into_connection(),
    );
    let service = service_on(&db);

    let error = service
        .create_user(
            &actor,
            new_user("south.tam"),
            UserRole::TaskAreaManager,
            AreaSelection::single(AreaChoice::New("South".to_string())),
        )
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AccessDenied);

    drop(service);
    let log = shared_sql_log(db);
    assert_eq!(occurrences(&log, INSERT_USER), 0);
    assert!(log.contains("ROLLBACK"));
}

#[tokio::test]
async fn existing_global_area_is_rejected_for_a_new_task_area_manager() {
    init_test_env();
    let global = global_area();

    let db = Arc::new(
        postgres()
            .append_query_results([Vec::<user_model::Model>::new()])
            .append_query_results([vec![global.clone()]])
            .into_connection(),
    );
    let service = service_on(&db);

    let error = service
        .create_user(
            &superuser(),
            new_user("global.tam"),
            UserRole::TaskAreaManager,
            AreaSelection::single(AreaChoice::Existing(global.id)),
        )
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);

    drop(service);
    let log = shared_sql_log(db);
    assert_eq!(occurrences(&log, INSERT_USER), 0);
}

#[tokio::test]
async fn taken_username_is_a_validation_error() {
    init_test_env();
    let north = Uuid::new_v4();
    let existing = created_row(&employee(north), "amani.lado");

    let db = Arc::new(
        postgres()
            .append_query_results([vec![existing]])
            .into_connection(),
    );
    let service = service_on(&db);

    let error = service
        .create_user(
            &superuser(),
            new_user("amani.lado"),
            UserRole::Employee,
            AreaSelection::single(AreaChoice::Existing(north)),
        )
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(error.to_string().contains("already taken"));

    drop(service);
    let log = shared_sql_log(db);
    assert_eq!(occurrences(&log, INSERT_USER), 0);
    assert!(!log.contains("task_areas"));
}

#[tokio::test]
async fn superuser_deactivates_another_user() {
    init_test_env();
    let target = employee(Uuid::new_v4());

    let db = Arc::new(
        postgres()
            .append_query_results([vec![user_row(&target)]])
            .append_exec_results([rows(1)])
            .into_connection(),
    );
    let service = service_on(&db);

    let deactivated = service
        .deactivate_user(&superuser(), target.user_id)
        .await
        .unwrap();
    assert_eq!(deactivated.id, target.user_id);
    assert!(!deactivated.is_active);

    drop(service);
    let log = shared_sql_log(db);
    assert_eq!(occurrences(&log, UPDATE_USER), 1);
    assert!(log.contains("is_active"));
}

#[tokio::test]
async fn deactivating_an_inactive_user_is_idempotent() {
    init_test_env();
    let target = employee(Uuid::new_v4());
    let inactive = user_model::Model {
        is_active: false,
        ..user_row(&target)
    };

    let db = Arc::new(
        postgres()
            .append_query_results([vec![inactive]])
            .append_exec_results([rows(0)])
            .into_connection(),
    );
    let service = service_on(&db);

    let result = service
        .deactivate_user(&superuser(), target.user_id)
        .await
        .unwrap();
    assert!(!result.is_active);
}

#[tokio::test]
async fn deactivation_is_superuser_only_and_never_self() {
    init_test_env();
    let north = Uuid::new_v4();
    let target = employee(north);
    let root = superuser();

    let db = Arc::new(postgres().into_connection());
    let service = service_on(&db);

    for (actor, target_id) in [
        (root.clone(), root.user_id),
        (head_manager([north]), target.user_id),
        (task_area_manager(north), target.user_id),
    ] {
        let error = service
            .deactivate_user(&actor, target_id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessDenied);
    }

    drop(service);
    assert_eq!(shared_sql_log(db), "[]");
}

#[tokio::test]
async fn deactivating_an_unknown_user_is_not_found() {
    init_test_env();

    let db = Arc::new(
        postgres()
            .append_query_results([Vec::<user_model::Model>::new()])
            .into_connection(),
    );
    let service = service_on(&db);

    let error = service
        .deactivate_user(&superuser(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}
