// portal-backend/src/utils/mod.rs
pub mod permission;
pub mod transaction;
pub mod validation;
