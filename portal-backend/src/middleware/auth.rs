// src/middleware/auth.rs

use crate::domain::principal::Principal;
use crate::domain::user_model;
use crate::error::AppError;
use crate::logging::{AuthenticatedActor, RequestContext};
use crate::repository::user_repository::UserRepository;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 認証済みユーザーを示すヘッダー（セッション層の代替）
pub const USER_ID_HEADER: &str = "x-user-id";

/// 認証ミドルウェアの設定
#[derive(Clone)]
pub struct AuthMiddlewareConfig {
    pub user_repository: Arc<UserRepository>,
    pub skip_auth_paths: Vec<String>,
}

impl AuthMiddlewareConfig {
    pub fn new(user_repository: Arc<UserRepository>) -> Self {
        Self {
            user_repository,
            skip_auth_paths: vec!["/health".to_string()],
        }
    }
}

/// 認証済みユーザー情報を格納するエクステンション
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: user_model::Model,
    pub principal: Principal,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.principal.user_id
    }
}

fn should_skip_auth(path: &str, skip_paths: &[String]) -> bool {
    skip_paths.iter().any(|p| path == p || path.ends_with(p.as_str()))
}

fn extract_user_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    Uuid::parse_str(raw)
        .map_err(|_| AppError::Unauthorized("Invalid user identifier".to_string()))
}

/// リクエストのアクターを解決してエクステンションに格納する
pub async fn auth_middleware(
    State(config): State<AuthMiddlewareConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    if should_skip_auth(&path, &config.skip_auth_paths) {
        debug!("Skipping auth for path: {}", path);
        return Ok(next.run(request).await);
    }

    let user_id = extract_user_id(request.headers()).inspect_err(|_| {
        warn!(path = %path, "Missing or malformed user identifier");
    })?;

    let (user, principal) = config
        .user_repository
        .find_principal(user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %user_id, path = %path, "Unknown user");
            AppError::Unauthorized("Unknown user".to_string())
        })?;

    if !user.is_active {
        warn!(
            user_id = %user_id,
            path = %path,
            "Access attempt with inactive account"
        );
        return Err(AppError::Forbidden("Account is inactive".to_string()));
    }

    if let Some(context) = request.extensions_mut().get_mut::<RequestContext>() {
        context.user_id = Some(user_id);
    }
    request
        .extensions_mut()
        .insert(AuthenticatedUser { user, principal });

    let mut response = next.run(request).await;
    response
        .extensions_mut()
        .insert(AuthenticatedActor(user_id));
    Ok(response)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
