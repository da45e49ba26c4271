// src/domain/mod.rs
pub mod approval_record_model;
pub mod area_assignment;
pub mod emergency_alert_model;
pub mod leave_application_model;
pub mod leave_status;
pub mod leave_workflow;
pub mod managed_task_area_model;
pub mod principal;
pub mod report_model;
pub mod task_area_model;
pub mod user_model;
pub mod user_role;
pub mod visibility;
