// src/api/handlers/mod.rs
pub mod alert_handler;
pub mod health_handler;
pub mod leave_handler;
pub mod report_handler;
pub mod user_handler;
