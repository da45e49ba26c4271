// src/service/mod.rs
pub mod alert_service;
pub mod leave_service;
pub mod report_service;
pub mod user_service;
