// tests/common/mock_db.rs
//
// MockDatabase の組み立てと、記録された SQL の取り出し。

use chrono::Utc;
use portal_backend::domain::task_area_model::{self, GLOBAL_TASK_AREA_NAME};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;
use uuid::Uuid;

pub const INSERT_APPROVAL_RECORD: &str = r#"INSERT INTO \"approval_records\""#;
pub const INSERT_TASK_AREA: &str = r#"INSERT INTO \"task_areas\""#;
pub const INSERT_USER: &str = r#"INSERT INTO \"users\""#;
pub const INSERT_MANAGED_AREA: &str = r#"INSERT INTO \"user_managed_task_areas\""#;
pub const UPDATE_LEAVE: &str = r#"UPDATE \"leave_applications\""#;
pub const UPDATE_USER: &str = r#"UPDATE \"users\""#;
pub const UPDATE_REPORT: &str = r#"UPDATE \"reports\""#;

pub fn postgres() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

pub fn rows(affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: affected,
    }
}

/// 記録された SQL を Debug 表現でまとめて取り出す
pub fn sql_log(db: DatabaseConnection) -> String {
    format!("{:?}", db.into_transaction_log())
}

/// サービスに渡した接続の SQL を取り出す（サービスは先に drop しておくこと）
pub fn shared_sql_log(db: Arc<DatabaseConnection>) -> String {
    match Arc::try_unwrap(db) {
        Ok(db) => sql_log(db),
        Err(_) => panic!("mock connection is still held by a service"),
    }
}

pub fn occurrences(log: &str, needle: &str) -> usize {
    log.matches(needle).count()
}

pub fn task_area(name: &str) -> task_area_model::Model {
    task_area_model::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        created_at: Utc::now(),
    }
}

pub fn global_area() -> task_area_model::Model {
    task_area(GLOBAL_TASK_AREA_NAME)
}
