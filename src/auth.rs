/// Authentication helpers and request extractors
use crate::{
    account::ValidatedSession,
    context::AppContext,
    error::{AppError, AppResult},
};
use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Authenticated user, extracted from the session behind the bearer token
///
/// Handlers that take this as an argument reject unauthenticated requests
/// with 401 before their body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub session_id: String,
}

impl From<ValidatedSession> for AuthUser {
    fn from(session: ValidatedSession) -> Self {
        Self {
            user_id: session.user_id,
            session_id: session.session_id,
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppContext) -> AppResult<Self> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let session = ctx.accounts.validate_access_token(&token).await?;
        Ok(session.into())
    }
}
