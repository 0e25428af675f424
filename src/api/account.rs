/// Account and session endpoints
use crate::{
    auth::AuthUser,
    context::AppContext,
    db::models::{Session, User},
    error::AppResult,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build account routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
        .route("/api/verify-email", post(verify_email))
        .route("/api/resend-verification", post(resend_verification))
        .route("/api/forgot-password", post(forgot_password))
        .route("/api/reset-password", post(reset_password))
}

/// Account fields safe to show to its owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires: DateTime<Utc>,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            access_expires: session.access_expires,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub session: SessionView,
}

async fn signup(
    State(ctx): State<AppContext>,
    Json(req): Json<SignupRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (user, verify_token) = ctx
        .accounts
        .create_account(req.username, req.email, req.password)
        .await?;

    // Verification email is best-effort; the account exists either way
    if ctx.mailer.is_configured() {
        if let Err(e) = ctx
            .mailer
            .send_verification_email(
                &user.email,
                &user.username,
                &verify_token,
                &ctx.config.service.public_url,
            )
            .await
        {
            tracing::error!("Failed to send verification email to {}: {}", user.email, e);
        }
    }

    let session = ctx.accounts.create_session(&user.id).await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        session: session.into(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (user, session) = ctx.accounts.login(&req.identifier, &req.password).await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        session: session.into(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

async fn refresh(
    State(ctx): State<AppContext>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<Json<SessionView>> {
    let session = ctx.accounts.refresh_session(&req.refresh_token).await?;
    Ok(Json(session.into()))
}

async fn logout(
    State(ctx): State<AppContext>,
    user: AuthUser,
) -> AppResult<Json<serde_json::Value>> {
    ctx.accounts.delete_session(&user.session_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn me(State(ctx): State<AppContext>, user: AuthUser) -> AppResult<Json<UserView>> {
    let user = ctx.accounts.get_user(&user.user_id).await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

async fn verify_email(
    State(ctx): State<AppContext>,
    Json(req): Json<VerifyEmailRequest>,
) -> AppResult<Json<serde_json::Value>> {
    ctx.accounts.confirm_email(&req.token).await?;
    Ok(Json(serde_json::json!({ "verified": true })))
}

async fn resend_verification(
    State(ctx): State<AppContext>,
    user: AuthUser,
) -> AppResult<Json<serde_json::Value>> {
    let token = ctx.accounts.regenerate_verify_token(&user.user_id).await?;
    let account = ctx.accounts.get_user(&user.user_id).await?;

    ctx.mailer
        .send_verification_email(
            &account.email,
            &account.username,
            &token,
            &ctx.config.service.public_url,
        )
        .await?;

    Ok(Json(serde_json::json!({ "sent": true })))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

async fn forgot_password(
    State(ctx): State<AppContext>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    // The response is identical whether or not the account exists, so the
    // endpoint cannot be used to probe for registered emails.
    if let Some((token, user)) = ctx.accounts.request_password_reset(&req.email).await? {
        let sent = ctx
            .mailer
            .send_password_reset_email(
                &user.email,
                &user.username,
                &token,
                &ctx.config.service.public_url,
            )
            .await;

        if let Err(e) = sent {
            // A token whose email never went out must not stay live
            ctx.accounts.discard_password_reset(&user.email).await?;
            return Err(e);
        }
    }

    Ok(Json(serde_json::json!({
        "message": "If that email is registered, a reset link has been sent"
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

async fn reset_password(
    State(ctx): State<AppContext>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    ctx.accounts.reset_password(&req.token, &req.new_password).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
