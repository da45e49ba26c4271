// tests/integration/api/error_response_tests.rs
//
// エラー種別から HTTP ステータスへの対応と、ルーター全体を通した応答を確認する。

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::{routing::get, Router};
use crate::common::*;
use portal_backend::api::{app_router, AppState};
use portal_backend::domain::leave_status::LeaveStatus;
use portal_backend::domain::managed_task_area_model;
use portal_backend::domain::principal::Principal;
use portal_backend::error::AppError;
use portal_backend::middleware::auth::USER_ID_HEADER;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn failing(error: fn() -> AppError) -> Router {
    Router::new().route(
        "/fail",
        get(move || async move { Err::<(), AppError>(error()) }),
    )
}

#[tokio::test]
async fn each_error_kind_maps_to_its_status() {
    init_test_env();

    let cases: [(fn() -> AppError, StatusCode, &str); 7] = [
        (
            || AppError::Forbidden("outside scope".to_string()),
            StatusCode::FORBIDDEN,
            "forbidden",
        ),
        (
            || AppError::ValidationError("managed_task_areas: required".to_string()),
            StatusCode::BAD_REQUEST,
            "validation_error",
        ),
        (
            || AppError::StateConflict("already approved".to_string()),
            StatusCode::CONFLICT,
            "state_conflict",
        ),
        (
            || AppError::NotFound("leave application".to_string()),
            StatusCode::NOT_FOUND,
            "not_found",
        ),
        (
            || AppError::Unauthorized("missing user".to_string()),
            StatusCode::UNAUTHORIZED,
            "unauthorized",
        ),
        (
            || AppError::BadRequest("bad id".to_string()),
            StatusCode::BAD_REQUEST,
            "bad_request",
        ),
        (
            || AppError::DbErr(DbErr::Custom("connection reset".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
        ),
    ];

    for (error, status, error_type) in cases {
        let response = failing(error)
            .oneshot(Request::get("/fail").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), status);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error_type"], error_type);
    }
}

#[tokio::test]
async fn internal_errors_do_not_leak_details() {
    init_test_env();
    let response = failing(|| AppError::InternalServerError("secret dsn".to_string()))
        .oneshot(Request::get("/fail").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert!(!body.to_string().contains("secret dsn"));
}

// === ルーター全体 ===

fn request(method: Method, uri: &str, actor: Option<&Principal>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(USER_ID_HEADER, actor.user_id.to_string());
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

// 認証ミドルウェアがアクターを読み込むための2クエリ分
fn authenticated(db: MockDatabase, actor: &Principal) -> MockDatabase {
    db.append_query_results([vec![user_row(actor)]])
        .append_query_results([Vec::<managed_task_area_model::Model>::new()])
}

#[tokio::test]
async fn health_is_reachable_without_identity() {
    init_test_env();
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let response = app_router(AppState::new(db))
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn missing_or_malformed_identity_is_unauthorized() {
    init_test_env();

    for header_value in [None, Some("not-a-uuid")] {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut req = request(Method::GET, "/api/leaves", None, None);
        if let Some(value) = header_value {
            req.headers_mut()
                .insert(USER_ID_HEADER, value.parse().unwrap());
        }

        let response = app_router(AppState::new(db)).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(json_body(response).await["error_type"], "unauthorized");
    }
}

#[tokio::test]
async fn unknown_and_inactive_users_are_turned_away() {
    init_test_env();
    let stranger = employee(Uuid::new_v4());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<portal_backend::domain::user_model::Model>::new()])
        .into_connection();
    let response = app_router(AppState::new(db))
        .oneshot(request(Method::GET, "/api/leaves", Some(&stranger), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let inactive = portal_backend::domain::user_model::Model {
        is_active: false,
        ..user_row(&stranger)
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![inactive]])
        .append_query_results([Vec::<managed_task_area_model::Model>::new()])
        .into_connection();
    let response = app_router(AppState::new(db))
        .oneshot(request(Method::GET, "/api/leaves", Some(&stranger), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_path_id_is_a_bad_request() {
    init_test_env();
    let actor = employee(Uuid::new_v4());
    let db = authenticated(MockDatabase::new(DatabaseBackend::Postgres), &actor).into_connection();

    let response = app_router(AppState::new(db))
        .oneshot(request(Method::GET, "/api/leaves/12345", Some(&actor), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_type"], "bad_request");
}

#[tokio::test]
async fn out_of_scope_leave_reads_as_not_found() {
    init_test_env();
    let applicant = employee(Uuid::new_v4());
    let outsider = employee(Uuid::new_v4());
    let application = leave_in(&applicant, LeaveStatus::PendingTaskArea);

    let db = authenticated(MockDatabase::new(DatabaseBackend::Postgres), &outsider)
        .append_query_results([vec![(application.clone(), user_row(&applicant))]])
        .into_connection();

    let uri = format!("/api/leaves/{}", application.id);
    let response = app_router(AppState::new(db))
        .oneshot(request(Method::GET, &uri, Some(&outsider), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approving_outside_scope_is_forbidden() {
    init_test_env();
    let applicant = employee(Uuid::new_v4());
    let other_manager = task_area_manager(Uuid::new_v4());
    let application = leave_in(&applicant, LeaveStatus::PendingTaskArea);

    let db = authenticated(MockDatabase::new(DatabaseBackend::Postgres), &other_manager)
        .append_query_results([vec![(application.clone(), user_row(&applicant))]])
        .into_connection();

    let uri = format!("/api/leaves/{}/approve", application.id);
    let response = app_router(AppState::new(db))
        .oneshot(request(
            Method::POST,
            &uri,
            Some(&other_manager),
            Some(serde_json::json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error_type"], "forbidden");
}

#[tokio::test]
async fn losing_a_concurrent_approval_is_a_conflict() {
    init_test_env();
    let area = Uuid::new_v4();
    let applicant = employee(area);
    let manager = task_area_manager(area);
    let application = leave_in(&applicant, LeaveStatus::PendingTaskArea);

    let db = authenticated(MockDatabase::new(DatabaseBackend::Postgres), &manager)
        .append_query_results([vec![(application.clone(), user_row(&applicant))]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let uri = format!("/api/leaves/{}/approve", application.id);
    let response = app_router(AppState::new(db))
        .oneshot(request(
            Method::POST,
            &uri,
            Some(&manager),
            Some(serde_json::json!({ "comment": "ok" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error_type"], "state_conflict");
}

#[tokio::test]
async fn blank_leave_reason_fails_validation() {
    init_test_env();
    let actor = employee(Uuid::new_v4());
    let db = authenticated(MockDatabase::new(DatabaseBackend::Postgres), &actor).into_connection();

    let payload = serde_json::json!({
        "leave_start_date": "2024-08-05",
        "leave_end_date": "2024-08-07",
        "leave_location": "Juba",
        "leave_reason": "   "
    });
    let response = app_router(AppState::new(db))
        .oneshot(request(Method::POST, "/api/leaves", Some(&actor), Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error_type"], "validation_errors");
    assert!(body["validation_errors"].get("leave_reason").is_some());
}

#[tokio::test]
async fn database_failures_surface_as_internal_errors() {
    init_test_env();
    let actor = employee(Uuid::new_v4());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset".to_string())])
        .into_connection();

    let response = app_router(AppState::new(db))
        .oneshot(request(Method::GET, "/api/leaves", Some(&actor), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(!body.to_string().contains("connection reset"));
}

#[tokio::test]
async fn superuser_cannot_deactivate_themselves() {
    init_test_env();
    let actor = superuser();
    let db = authenticated(MockDatabase::new(DatabaseBackend::Postgres), &actor).into_connection();

    let uri = format!("/api/users/{}", actor.user_id);
    let response = app_router(AppState::new(db))
        .oneshot(request(Method::DELETE, &uri, Some(&actor), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error_type"], "forbidden");
}

#[tokio::test]
async fn malformed_username_fails_validation_on_create() {
    init_test_env();
    let actor = superuser();
    let db = authenticated(MockDatabase::new(DatabaseBackend::Postgres), &actor).into_connection();

    let payload = serde_json::json!({
        "username": "amani lado!",
        "full_name": "Amani Lado",
        "role": "employee"
    });
    let response = app_router(AppState::new(db))
        .oneshot(request(Method::POST, "/api/users", Some(&actor), Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error_type"], "validation_errors");
    assert!(body["validation_errors"].get("username").is_some());
}
