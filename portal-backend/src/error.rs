// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Multiple validation errors")]
    ValidationErrors(Vec<String>),

    #[error("Validation failed")]
    ValidationFailure(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

/// 呼び出し側が表示を出し分けるためのエラー分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 権限不足
    AccessDenied,
    /// 入力・割り当て条件の違反
    Validation,
    /// 他の操作が先に状態を変更した
    StateConflict,
    NotFound,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::Validation => "validation",
            Self::StateConflict => "state_conflict",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Internal => "internal",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Forbidden(_) => ErrorKind::AccessDenied,
            AppError::ValidationError(_)
            | AppError::ValidationErrors(_)
            | AppError::ValidationFailure(_)
            | AppError::BadRequest(_) => ErrorKind::Validation,
            AppError::StateConflict(_) => ErrorKind::StateConflict,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::DbErr(DbErr::RecordNotFound(_)) => ErrorKind::NotFound,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::DbErr(_) | AppError::InternalServerError(_) => ErrorKind::Internal,
        }
    }

    pub fn is_access_denied(&self) -> bool {
        self.kind() == ErrorKind::AccessDenied
    }

    pub fn is_state_conflict(&self) -> bool {
        self.kind() == ErrorKind::StateConflict
    }
}

fn simple_response(message: String, error_type: &str) -> ErrorResponse {
    ErrorResponse {
        success: false,
        error: message.clone(),
        message,
        details: None,
        validation_errors: None,
        errors: None,
        error_type: error_type.to_string(),
    }
}

// axum でエラーをHTTPレスポンスに変換するための実装
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, error_response) = match self {
            AppError::DbErr(db_err) => {
                tracing::error!(error = ?db_err, "Database error"); // サーバーログには詳細を出す

                let status = match db_err {
                    DbErr::RecordNotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };

                let (message, details) = match &db_err {
                    DbErr::RecordNotFound(entity) => (
                        "The requested resource was not found".to_string(),
                        Some(json!({ "entity": entity })),
                    ),
                    DbErr::Exec(_) => (
                        "A database operation failed".to_string(),
                        Some(json!({ "operation": "exec" })),
                    ),
                    DbErr::Query(_) => (
                        "A database query failed".to_string(),
                        Some(json!({ "operation": "query" })),
                    ),
                    _ => ("A database error occurred".to_string(), None),
                };

                (
                    status,
                    ErrorResponse {
                        details,
                        ..simple_response(message, "database_error")
                    },
                )
            }
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, simple_response(message, "not_found"))
            }
            AppError::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                simple_response(message, "validation_error"),
            ),
            AppError::ValidationErrors(errors) => {
                let mut field_errors = HashMap::new();
                for error in &errors {
                    if let Some((field, message)) = error.split_once(": ") {
                        field_errors
                            .entry(field.to_string())
                            .or_insert_with(Vec::new)
                            .push(message.to_string());
                    }
                }
                let errors_array: Vec<serde_json::Value> =
                    errors.iter().map(|e| json!({"message": e})).collect();
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        validation_errors: Some(field_errors),
                        errors: Some(errors_array),
                        ..simple_response("Validation failed".to_string(), "validation_errors")
                    },
                )
            }
            AppError::ValidationFailure(errors) => {
                let mut field_errors: HashMap<String, Vec<String>> = HashMap::new();
                collect_field_errors(&errors, &mut field_errors);
                let errors_array: Vec<serde_json::Value> = field_errors
                    .iter()
                    .flat_map(|(field, messages)| {
                        messages
                            .iter()
                            .map(move |msg| json!({"message": format!("{}: {}", field, msg)}))
                    })
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        validation_errors: Some(field_errors),
                        errors: Some(errors_array),
                        ..simple_response("Validation failed".to_string(), "validation_errors")
                    },
                )
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                simple_response(message, "bad_request"),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                simple_response(message, "unauthorized"),
            ),
            AppError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, simple_response(message, "forbidden"))
            }
            AppError::StateConflict(message) => (
                StatusCode::CONFLICT,
                simple_response(message, "state_conflict"),
            ),
            AppError::InternalServerError(message) => {
                tracing::error!(error = %message, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    simple_response(
                        "An internal server error occurred".to_string(),
                        "internal_server_error",
                    ),
                )
            }
        };

        let mut response = (status, Json(error_response)).into_response();
        response.extensions_mut().insert(kind);
        response
    }
}

// ネストした（flatten された）構造体のエラーもフィールド名で集める
fn collect_field_errors(errors: &ValidationErrors, out: &mut HashMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = out.entry(field.to_string()).or_default();
                messages.extend(field_errors.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map_or_else(|| "Invalid value".to_string(), |m| m.to_string())
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_field_errors(nested, out);
                }
            }
        }
    }
}

// Result 型のエイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 統一的なエラーレスポンス構造
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
    pub error_type: String,
}
