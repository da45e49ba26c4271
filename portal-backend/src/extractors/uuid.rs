use crate::error::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

/// 値の直前の資源名から ID パラメータ名を推測する
fn id_param_name(path: &str, raw: &str) -> &'static str {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .iter()
        .position(|s| *s == raw)
        .and_then(|i| i.checked_sub(1))
        .map(|i| match segments[i] {
            "users" => "user_id",
            "leaves" => "application_id",
            "reports" => "report_id",
            "alerts" => "alert_id",
            _ => "id",
        })
        .unwrap_or("id")
}

/// パスパラメータからUUIDを抽出し、形式エラーは 400 にする
#[derive(Debug, Clone, Copy)]
pub struct ValidatedUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidatedUuid
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Missing path parameter: {}", e)))?;

        let uuid = Uuid::parse_str(&raw).map_err(|_| {
            AppError::BadRequest(format!(
                "Invalid UUID format for '{}': '{}'",
                id_param_name(parts.uri.path(), &raw),
                raw
            ))
        })?;

        Ok(ValidatedUuid(uuid))
    }
}
