/// Account manager implementation using runtime queries
use crate::{
    account::{TokenCheck, ValidatedSession},
    config::AppConfig,
    db::models::{PasswordReset, Session, User},
    error::{AppError, AppResult},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Verification links are valid for 24 hours
const VERIFY_TOKEN_TTL_HOURS: i64 = 24;
/// Reset links are valid for 1 hour and single-use
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Hash a security token for storage; plaintext tokens never touch the database
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Generate a random URL-safe token for email links
fn generate_link_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();

    (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<AppConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Create a new account
    ///
    /// Returns the stored user together with the plaintext verification
    /// token, which exists only long enough to be emailed.
    pub async fn create_account(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> AppResult<(User, String)> {
        self.validate_username(&username)?;
        self.validate_email(&email)?;
        self.validate_password(&password)?;

        if self.username_exists(&username).await? {
            return Err(AppError::Conflict(format!(
                "Username {} already taken",
                username
            )));
        }

        if self.email_exists(&email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = self.hash_password(&password)?;

        let verify_token = generate_link_token();
        let now = Utc::now();
        let verify_expires = now + Duration::hours(VERIFY_TOKEN_TTL_HOURS);

        let user = User {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            email_verified: false,
            verify_token_hash: Some(hash_token(&verify_token)),
            verify_token_expires: Some(verify_expires),
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO user (id, username, email, password_hash, email_verified,
                               verify_token_hash, verify_token_expires, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.email_verified)
        .bind(&user.verify_token_hash)
        .bind(user.verify_token_expires)
        .bind(user.created_at)
        .execute(&self.db)
        .await?;

        tracing::info!("Created account for {}", user.username);

        Ok((user, verify_token))
    }

    /// Authenticate account and create session
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<(User, Session)> {
        let user = self
            .get_user_by_identifier(identifier)
            .await
            .map_err(|_| AppError::Authentication("Invalid credentials".to_string()))?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let session = self.create_session(&user.id).await?;

        Ok((user, session))
    }

    /// Create a session for a user
    pub async fn create_session(&self, user_id: &str) -> AppResult<Session> {
        let session_id = Uuid::new_v4().to_string();

        let access_token = self.generate_token(user_id, &session_id, self.config.auth.access_ttl_secs)?;
        let refresh_token = self.generate_token(user_id, &session_id, self.config.auth.refresh_ttl_secs)?;

        let now = Utc::now();
        let access_expires = now + Duration::seconds(self.config.auth.access_ttl_secs);
        let refresh_expires = now + Duration::seconds(self.config.auth.refresh_ttl_secs);

        sqlx::query(
            "INSERT INTO session (id, user_id, access_token, refresh_token,
                                  created_at, access_expires, refresh_expires)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&session_id)
        .bind(user_id)
        .bind(&access_token)
        .bind(&refresh_token)
        .bind(now)
        .bind(access_expires)
        .bind(refresh_expires)
        .execute(&self.db)
        .await?;

        Ok(Session {
            id: session_id,
            user_id: user_id.to_string(),
            access_token,
            refresh_token,
            created_at: now,
            access_expires,
            refresh_expires,
        })
    }

    /// Validate access token and return session info
    pub async fn validate_access_token(&self, token: &str) -> AppResult<ValidatedSession> {
        let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, user_id, access_expires FROM session WHERE access_token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        let (session_id, user_id, access_expires) = row
            .ok_or_else(|| AppError::Authentication("Invalid or expired session".to_string()))?;

        if Utc::now() > access_expires {
            return Err(AppError::Authentication("Session expired".to_string()));
        }

        Ok(ValidatedSession {
            user_id,
            session_id,
        })
    }

    /// Delete a session (logout)
    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM session WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Rotate a session using its refresh token
    ///
    /// The old session is removed so a stolen refresh token cannot be
    /// replayed after its holder rotates.
    pub async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session> {
        let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, user_id, refresh_expires FROM session WHERE refresh_token = ?1",
        )
        .bind(refresh_token)
        .fetch_optional(&self.db)
        .await?;

        let (session_id, user_id, refresh_expires) = row
            .ok_or_else(|| AppError::Authentication("Invalid refresh token".to_string()))?;

        if Utc::now() > refresh_expires {
            return Err(AppError::Authentication("Refresh token expired".to_string()));
        }

        self.delete_session(&session_id).await?;
        self.create_session(&user_id).await
    }

    /// Get user by id
    pub async fn get_user(&self, user_id: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM user WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        Ok(user)
    }

    /// Find user by username or email
    pub async fn get_user_by_identifier(&self, identifier: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM user WHERE username = ?1 OR email = ?1",
        )
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Confirm email address using verification token
    ///
    /// Returns the verified user's id.
    pub async fn confirm_email(&self, token: &str) -> AppResult<String> {
        match self.check_verify_token(token).await? {
            TokenCheck::Valid(user_id) => {
                sqlx::query(
                    "UPDATE user SET email_verified = 1,
                                     verify_token_hash = NULL,
                                     verify_token_expires = NULL
                     WHERE id = ?1",
                )
                .bind(&user_id)
                .execute(&self.db)
                .await?;

                tracing::info!("Email verified for user {}", user_id);
                Ok(user_id)
            }
            TokenCheck::Expired => Err(AppError::Validation(
                "Verification token has expired".to_string(),
            )),
            TokenCheck::Consumed => Err(AppError::Validation(
                "Email is already verified".to_string(),
            )),
            TokenCheck::NotFound => Err(AppError::NotFound(
                "Invalid verification token".to_string(),
            )),
        }
    }

    async fn check_verify_token(&self, token: &str) -> AppResult<TokenCheck<String>> {
        let row: Option<(String, bool, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT id, email_verified, verify_token_expires
             FROM user WHERE verify_token_hash = ?1",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.db)
        .await?;

        let Some((user_id, verified, expires)) = row else {
            return Ok(TokenCheck::NotFound);
        };

        if verified {
            return Ok(TokenCheck::Consumed);
        }

        match expires {
            Some(expires) if Utc::now() <= expires => Ok(TokenCheck::Valid(user_id)),
            _ => Ok(TokenCheck::Expired),
        }
    }

    /// Issue a fresh verification token for an unverified account
    pub async fn regenerate_verify_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.get_user(user_id).await?;

        if user.email_verified {
            return Err(AppError::Validation(
                "Email is already verified".to_string(),
            ));
        }

        let token = generate_link_token();
        let expires = Utc::now() + Duration::hours(VERIFY_TOKEN_TTL_HOURS);

        sqlx::query(
            "UPDATE user SET verify_token_hash = ?1, verify_token_expires = ?2 WHERE id = ?3",
        )
        .bind(hash_token(&token))
        .bind(expires)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(token)
    }

    /// Create a password reset token for an email, if an account exists
    ///
    /// Returns None for unknown emails so the caller can answer with the
    /// same generic message either way.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<Option<(String, User)>> {
        let user = match self.get_user_by_identifier(email).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let token = generate_link_token();
        let expires = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        sqlx::query(
            "INSERT INTO password_reset (email, token_hash, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO UPDATE SET
                 token_hash = excluded.token_hash,
                 expires_at = excluded.expires_at",
        )
        .bind(&user.email)
        .bind(hash_token(&token))
        .bind(expires)
        .execute(&self.db)
        .await?;

        Ok(Some((token, user)))
    }

    /// Discard a pending reset request
    ///
    /// Used to roll back the token when the reset email cannot be sent.
    pub async fn discard_password_reset(&self, email: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM password_reset WHERE email = ?1")
            .bind(email)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Reset password using reset token
    ///
    /// Consumes the token and invalidates every session of the account.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        self.validate_password(new_password)?;

        let reset = match self.check_reset_token(token).await? {
            TokenCheck::Valid(reset) => reset,
            TokenCheck::Expired => {
                return Err(AppError::Validation("Reset token has expired".to_string()))
            }
            _ => return Err(AppError::NotFound("Invalid reset token".to_string())),
        };

        let user = self.get_user_by_identifier(&reset.email).await?;
        let password_hash = self.hash_password(new_password)?;

        sqlx::query("UPDATE user SET password_hash = ?1 WHERE id = ?2")
            .bind(&password_hash)
            .bind(&user.id)
            .execute(&self.db)
            .await?;

        // Single-use: the consumed token must not work twice
        self.discard_password_reset(&reset.email).await?;

        sqlx::query("DELETE FROM session WHERE user_id = ?1")
            .bind(&user.id)
            .execute(&self.db)
            .await?;

        tracing::info!("Password reset for user {}", user.id);

        Ok(())
    }

    async fn check_reset_token(&self, token: &str) -> AppResult<TokenCheck<PasswordReset>> {
        let reset: Option<PasswordReset> = sqlx::query_as(
            "SELECT email, token_hash, expires_at FROM password_reset WHERE token_hash = ?1",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.db)
        .await?;

        let Some(reset) = reset else {
            return Ok(TokenCheck::NotFound);
        };

        if Utc::now() > reset.expires_at {
            return Ok(TokenCheck::Expired);
        }

        Ok(TokenCheck::Valid(reset))
    }

    /// Cleanup expired sessions and reset tokens
    ///
    /// Called periodically to keep the tables from accumulating dead rows.
    /// Returns (sessions_deleted, resets_deleted).
    pub async fn cleanup_expired(&self) -> AppResult<(u64, u64)> {
        let now = Utc::now();

        let sessions = sqlx::query("DELETE FROM session WHERE refresh_expires < ?1")
            .bind(now)
            .execute(&self.db)
            .await?
            .rows_affected();

        let resets = sqlx::query("DELETE FROM password_reset WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.db)
            .await?
            .rows_affected();

        if sessions > 0 || resets > 0 {
            tracing::info!(sessions, resets, "Cleaned up expired credentials");
        } else {
            tracing::debug!("Credential cleanup: nothing expired");
        }

        Ok((sessions, resets))
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AppError::Internal(format!("Corrupt password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Generate a signed session JWT
    fn generate_token(&self, user_id: &str, session_id: &str, ttl_secs: i64) -> AppResult<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize)]
        struct Claims {
            sub: String,
            sid: String,
            iat: i64,
            exp: i64,
            jti: String,
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            iat: now,
            exp: now + ttl_secs,
            // Access and refresh tokens are minted in the same instant;
            // the nonce keeps them distinct
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.auth.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(token)
    }

    fn validate_username(&self, username: &str) -> AppResult<()> {
        if username.len() < 3 {
            return Err(AppError::Validation(
                "Username must be at least 3 characters".to_string(),
            ));
        }

        if username.len() > 64 {
            return Err(AppError::Validation("Username too long".to_string()));
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::Validation(
                "Username contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_email(&self, email: &str) -> AppResult<()> {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }

        Ok(())
    }

    fn validate_password(&self, password: &str) -> AppResult<()> {
        if password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use std::path::PathBuf;

    async fn create_test_manager() -> AccountManager {
        let db = SqlitePool::connect(":memory:").await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE user (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                email_verified BOOLEAN NOT NULL DEFAULT 0,
                verify_token_hash TEXT,
                verify_token_expires DATETIME,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE session (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                access_token TEXT UNIQUE NOT NULL,
                refresh_token TEXT UNIQUE NOT NULL,
                created_at DATETIME NOT NULL,
                access_expires DATETIME NOT NULL,
                refresh_expires DATETIME NOT NULL,
                FOREIGN KEY (user_id) REFERENCES user(id)
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE password_reset (
                email TEXT PRIMARY KEY,
                token_hash TEXT NOT NULL,
                expires_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        let config = Arc::new(AppConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8080,
                public_url: "http://localhost:8080".to_string(),
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from(":memory:"),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-key-for-testing-only-0123".to_string(),
                access_ttl_secs: 3600,
                refresh_ttl_secs: 30 * 24 * 3600,
            },
            email: None,
            time: TimeConfig {
                tz_offset_minutes: 0,
            },
        });

        AccountManager::new(db, config)
    }

    #[tokio::test]
    async fn signup_then_login() {
        let manager = create_test_manager().await;

        let (user, _token) = manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();
        assert!(!user.email_verified);

        let (logged_in, session) = manager.login("alice", "correct-horse").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let validated = manager
            .validate_access_token(&session.access_token)
            .await
            .unwrap();
        assert_eq!(validated.user_id, user.id);
    }

    #[tokio::test]
    async fn login_by_email_works_too() {
        let manager = create_test_manager().await;
        manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();

        assert!(manager
            .login("alice@example.com", "correct-horse")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn wrong_password_rejected() {
        let manager = create_test_manager().await;
        manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();

        let err = manager.login("alice", "wrong-horse").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn duplicate_username_and_email_conflict() {
        let manager = create_test_manager().await;
        manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();

        let same_name = manager
            .create_account(
                "alice".to_string(),
                "other@example.com".to_string(),
                "password-123".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(same_name, AppError::Conflict(_)));

        let same_email = manager
            .create_account(
                "bob".to_string(),
                "alice@example.com".to_string(),
                "password-123".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(same_email, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn bogus_access_token_rejected() {
        let manager = create_test_manager().await;
        let err = manager
            .validate_access_token("not-a-real-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn refresh_rotates_the_session() {
        let manager = create_test_manager().await;
        let (user, _) = manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();

        let session = manager.create_session(&user.id).await.unwrap();
        let rotated = manager
            .refresh_session(&session.refresh_token)
            .await
            .unwrap();
        assert_ne!(rotated.id, session.id);

        // Old refresh token no longer exists
        let err = manager
            .refresh_session(&session.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn email_verification_lifecycle() {
        let manager = create_test_manager().await;
        let (user, token) = manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();

        let verified_id = manager.confirm_email(&token).await.unwrap();
        assert_eq!(verified_id, user.id);
        assert!(manager.get_user(&user.id).await.unwrap().email_verified);

        // Token is cleared on use
        let err = manager.confirm_email(&token).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = manager.regenerate_verify_token(&user.id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn expired_verification_token_rejected() {
        let manager = create_test_manager().await;
        let (user, token) = manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();

        sqlx::query("UPDATE user SET verify_token_expires = ?1 WHERE id = ?2")
            .bind(Utc::now() - Duration::hours(1))
            .bind(&user.id)
            .execute(&manager.db)
            .await
            .unwrap();

        let err = manager.confirm_email(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn password_reset_is_single_use_and_kills_sessions() {
        let manager = create_test_manager().await;
        let (user, _) = manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();
        let session = manager.create_session(&user.id).await.unwrap();

        let (token, _) = manager
            .request_password_reset("alice@example.com")
            .await
            .unwrap()
            .unwrap();

        manager.reset_password(&token, "new-password-1").await.unwrap();

        // Old credentials are gone
        assert!(manager.login("alice", "correct-horse").await.is_err());
        assert!(manager
            .validate_access_token(&session.access_token)
            .await
            .is_err());
        assert!(manager.login("alice", "new-password-1").await.is_ok());

        // Token was consumed
        let err = manager
            .reset_password(&token, "another-pass-2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_email_reset_request_returns_none() {
        let manager = create_test_manager().await;
        let result = manager
            .request_password_reset("nobody@example.com")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn expired_reset_token_rejected() {
        let manager = create_test_manager().await;
        manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();

        let (token, _) = manager
            .request_password_reset("alice@example.com")
            .await
            .unwrap()
            .unwrap();

        sqlx::query("UPDATE password_reset SET expires_at = ?1")
            .bind(Utc::now() - Duration::minutes(5))
            .execute(&manager.db)
            .await
            .unwrap();

        let err = manager
            .reset_password(&token, "new-password-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn cleanup_removes_expired_rows() {
        let manager = create_test_manager().await;
        let (user, _) = manager
            .create_account(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "correct-horse".to_string(),
            )
            .await
            .unwrap();

        manager.create_session(&user.id).await.unwrap();
        sqlx::query("UPDATE session SET refresh_expires = ?1")
            .bind(Utc::now() - Duration::days(1))
            .execute(&manager.db)
            .await
            .unwrap();

        manager
            .request_password_reset("alice@example.com")
            .await
            .unwrap();
        sqlx::query("UPDATE password_reset SET expires_at = ?1")
            .bind(Utc::now() - Duration::days(1))
            .execute(&manager.db)
            .await
            .unwrap();

        let (sessions, resets) = manager.cleanup_expired().await.unwrap();
        assert_eq!(sessions, 1);
        assert_eq!(resets, 1);
    }
}
