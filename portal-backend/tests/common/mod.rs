// tests/common/mod.rs
#![allow(dead_code)]

pub mod mock_db;

use chrono::{NaiveDate, Utc};
use portal_backend::domain::leave_application_model;
use portal_backend::domain::leave_status::LeaveStatus;
use portal_backend::domain::principal::Principal;
use portal_backend::domain::user_model;
use portal_backend::domain::user_role::UserRole;
use portal_backend::domain::visibility::OwnerContext;
use std::sync::Once;
use uuid::Uuid;

// テスト環境の初期化を一度だけ実行
static INIT: Once = Once::new();

/// テスト環境を初期化
pub fn init_test_env() {
    INIT.call_once(|| {
        dotenvy::from_filename(".env.test").ok();

        // テスト用のログ設定
        let _ = tracing_subscriber::fmt()
            .with_env_filter("portal_backend=debug,tower_http=debug")
            .with_test_writer()
            .try_init();
    });
}

// === アクター ===

pub fn superuser() -> Principal {
    Principal::new(Uuid::new_v4(), UserRole::Superuser)
}

pub fn head_manager<I>(areas: I) -> Principal
where
    I: IntoIterator<Item = Uuid>,
{
    Principal::new(Uuid::new_v4(), UserRole::HeadManager).with_managed_task_areas(areas)
}

pub fn task_area_manager(area: Uuid) -> Principal {
    Principal::new(Uuid::new_v4(), UserRole::TaskAreaManager).with_task_area(area)
}

pub fn employee(area: Uuid) -> Principal {
    Principal::new(Uuid::new_v4(), UserRole::Employee).with_task_area(area)
}

pub fn owner_of(principal: &Principal) -> OwnerContext {
    OwnerContext::new(principal.user_id, principal.role, principal.task_area_id)
}

// === 行データ ===

/// アクターに対応するユーザー行
pub fn user_row(principal: &Principal) -> user_model::Model {
    let now = Utc::now();
    let short = &principal.user_id.to_string()[..8];
    user_model::Model {
        id: principal.user_id,
        username: format!("user_{}", short),
        full_name: format!("Test User {}", short),
        role: principal.role,
        task_area_id: principal.task_area_id,
        latitude: None,
        longitude: None,
        location_address: None,
        location_updated_at: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn leave_day(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, day).unwrap_or_default()
}

/// 申請者の下書き（2024-08-05 から 3 日間）
pub fn draft_leave(applicant: &Principal) -> leave_application_model::Model {
    let now = Utc::now();
    leave_application_model::Model {
        id: Uuid::new_v4(),
        applicant_id: applicant.user_id,
        leave_start_date: leave_day(5),
        leave_end_date: leave_day(7),
        leave_location: "Juba".to_string(),
        leave_latitude: None,
        leave_longitude: None,
        leave_reason: "Family visit".to_string(),
        status: LeaveStatus::Draft,
        task_area_manager_approved: false,
        task_area_manager_approver_id: None,
        task_area_manager_approval_date: None,
        head_manager_approved: false,
        head_manager_approver_id: None,
        head_manager_approval_date: None,
        rejection_reason: None,
        rejected_by: None,
        cancellation_reason: None,
        cancellation_date: None,
        created_at: now,
        updated_at: now,
    }
}

/// 指定状態の申請
pub fn leave_in(applicant: &Principal, status: LeaveStatus) -> leave_application_model::Model {
    leave_application_model::Model {
        status,
        ..draft_leave(applicant)
    }
}
