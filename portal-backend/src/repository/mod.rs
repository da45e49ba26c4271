// src/repository/mod.rs
pub mod approval_record_repository;
pub mod emergency_alert_repository;
pub mod leave_application_repository;
pub mod report_repository;
pub mod task_area_repository;
pub mod user_repository;
