// src/api/dto/mod.rs
pub mod alert_dto;
pub mod leave_dto;
pub mod report_dto;
pub mod user_dto;
