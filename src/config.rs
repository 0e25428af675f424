/// Configuration management for the Durood Tracker service
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub email: Option<EmailConfig>,
    pub time: TimeConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Public base URL used in emailed links
    pub public_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Application time configuration
///
/// Every "today" computation in the service uses one fixed UTC offset so
/// streaks, goals and prayer logs agree on calendar-day boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    pub tz_offset_minutes: i32,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("DT_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("DT_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;
        let public_url = env::var("DT_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));

        let data_directory: PathBuf = env::var("DT_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("DT_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("durood.sqlite"));

        let jwt_secret = env::var("DT_JWT_SECRET")
            .map_err(|_| AppError::Validation("JWT secret required".to_string()))?;
        let access_ttl_secs = env::var("DT_ACCESS_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);
        let refresh_ttl_secs = env::var("DT_REFRESH_TTL_SECS")
            .unwrap_or_else(|_| (30 * 24 * 3600).to_string())
            .parse()
            .unwrap_or(30 * 24 * 3600);

        let email = if let Ok(smtp_url) = env::var("DT_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("DT_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        // Default offset is UTC+5
        let tz_offset_minutes = env::var("DT_TZ_OFFSET_MINUTES")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        Ok(AppConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            auth: AuthConfig {
                jwt_secret,
                access_ttl_secs,
                refresh_ttl_secs,
            },
            email,
            time: TimeConfig { tz_offset_minutes },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(AppError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.time.tz_offset_minutes.abs() > 14 * 60 {
            return Err(AppError::Validation(
                "Timezone offset outside valid range".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
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
                tz_offset_minutes: 300,
            },
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn short_jwt_secret_rejected() {
        let mut config = test_config();
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn absurd_tz_offset_rejected() {
        let mut config = test_config();
        config.time.tz_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());
    }
}
