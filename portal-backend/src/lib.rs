// src/lib.rs
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod repository;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use types::ApiResponse;
