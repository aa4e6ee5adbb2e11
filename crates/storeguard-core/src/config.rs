//! Configuration module
//!
//! Plain-value settings for the HTTP surface, the file intake policy and the
//! persistence collaborator. Everything is read from the environment (after
//! loading a `.env` file if present) and falls back to a default.

use std::env;
use std::str::FromStr;

const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 10;
const MAX_IMAGE_WIDTH: u32 = 1920;
const MAX_IMAGE_HEIGHT: u32 = 1080;
const MAX_FORM_BODY_KB: usize = 1024;
const AUDIT_DEFAULT_LIMIT: usize = 100;

pub const DEFAULT_ALLOWED_EXTENSIONS: &str = "jpg,jpeg,png,gif,bmp,pdf,doc,docx,txt";
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/bmp,application/pdf,application/msword,application/vnd.openxmlformats-officedocument.wordprocessingml.document,text/plain";

/// What to do with a stored upload the signature scan flags as unsafe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsafeUploadAction {
    /// Keep the bytes, record `is_safe = false` and refuse downloads
    #[default]
    Flag,
    /// Delete the bytes and fail the upload
    Reject,
}

impl FromStr for UnsafeUploadAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flag" => Ok(UnsafeUploadAction::Flag),
            "reject" => Ok(UnsafeUploadAction::Reject),
            other => Err(anyhow::anyhow!(
                "UNSAFE_UPLOAD_ACTION must be 'flag' or 'reject', got '{}'",
                other
            )),
        }
    }
}

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub trusted_proxy_count: usize,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct GuardConfig {
    pub base: BaseConfig,
    pub storage_path: String,
    pub max_upload_bytes: usize,
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    pub unsafe_upload_action: UnsafeUploadAction,
    pub max_form_body_bytes: usize,
    pub audit_default_limit: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GuardConfig>);

impl Config {
    fn inner(&self) -> &GuardConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config(Box::new(GuardConfig::from_env()?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn server_host(&self) -> &str {
        &self.inner().base.server_host
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().base.database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.inner().base.trusted_proxy_count
    }

    pub fn storage_path(&self) -> &str {
        &self.inner().storage_path
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.inner().max_upload_bytes
    }

    pub fn max_image_dimensions(&self) -> (u32, u32) {
        (self.inner().max_image_width, self.inner().max_image_height)
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.inner().allowed_content_types
    }

    pub fn unsafe_upload_action(&self) -> UnsafeUploadAction {
        self.inner().unsafe_upload_action
    }

    pub fn max_form_body_bytes(&self) -> usize {
        self.inner().max_form_body_bytes
    }

    pub fn audit_default_limit(&self) -> usize {
        self.inner().audit_default_limit
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl GuardConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            environment,
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            trusted_proxy_count: env_or("TRUSTED_PROXY_COUNT", 0usize),
        };

        let unsafe_upload_action = match env::var("UNSAFE_UPLOAD_ACTION") {
            Ok(value) => value.parse()?,
            Err(_) => UnsafeUploadAction::default(),
        };

        Ok(GuardConfig {
            base,
            storage_path: env::var("UPLOAD_STORAGE_PATH")
                .unwrap_or_else(|_| "./uploads".to_string()),
            max_upload_bytes: env_or("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB) * 1024 * 1024,
            max_image_width: env_or("MAX_IMAGE_WIDTH", MAX_IMAGE_WIDTH),
            max_image_height: env_or("MAX_IMAGE_HEIGHT", MAX_IMAGE_HEIGHT),
            allowed_extensions: parse_list(
                &env::var("ALLOWED_EXTENSIONS")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.to_string()),
            ),
            allowed_content_types: parse_list(
                &env::var("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_CONTENT_TYPES.to_string()),
            ),
            unsafe_upload_action,
            max_form_body_bytes: env_or("MAX_FORM_BODY_KB", MAX_FORM_BODY_KB) * 1024,
            audit_default_limit: env_or("AUDIT_DEFAULT_LIMIT", AUDIT_DEFAULT_LIMIT),
        })
    }

    /// Defaults without touching the environment; used by tests and embedders.
    pub fn with_defaults(storage_path: impl Into<String>) -> Self {
        GuardConfig {
            base: BaseConfig {
                server_host: "127.0.0.1".to_string(),
                server_port: SERVER_PORT,
                environment: "development".to_string(),
                database_url: None,
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                trusted_proxy_count: 0,
            },
            storage_path: storage_path.into(),
            max_upload_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            max_image_width: MAX_IMAGE_WIDTH,
            max_image_height: MAX_IMAGE_HEIGHT,
            allowed_extensions: parse_list(DEFAULT_ALLOWED_EXTENSIONS),
            allowed_content_types: parse_list(DEFAULT_ALLOWED_CONTENT_TYPES),
            unsafe_upload_action: UnsafeUploadAction::Flag,
            max_form_body_bytes: MAX_FORM_BODY_KB * 1024,
            audit_default_limit: AUDIT_DEFAULT_LIMIT,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(url) = &self.base.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.max_image_width == 0 || self.max_image_height == 0 {
            return Err(anyhow::anyhow!(
                "MAX_IMAGE_WIDTH and MAX_IMAGE_HEIGHT must be greater than 0"
            ));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        if self.storage_path.trim().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_STORAGE_PATH must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_limits() {
        let config = Config(Box::new(GuardConfig::with_defaults("./uploads")));
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.max_image_dimensions(), (1920, 1080));
        assert!(config.allowed_extensions().iter().any(|e| e == "docx"));
        assert!(config
            .allowed_content_types()
            .iter()
            .any(|c| c == "text/plain"));
        assert_eq!(config.unsafe_upload_action(), UnsafeUploadAction::Flag);
        assert!(config.validate().is_ok());
        assert!(!config.is_production());
    }

    #[test]
    fn test_parse_list_strips_dots_and_case() {
        assert_eq!(
            parse_list(".JPG, png ,,.Txt"),
            vec!["jpg".to_string(), "png".to_string(), "txt".to_string()]
        );
    }

    #[test]
    fn test_validate_rejects_non_postgres_url() {
        let mut config = GuardConfig::with_defaults("./uploads");
        config.base.database_url = Some("mysql://localhost/db".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsafe_upload_action_parse() {
        assert_eq!(
            "Reject".parse::<UnsafeUploadAction>().unwrap(),
            UnsafeUploadAction::Reject
        );
        assert!("quarantine".parse::<UnsafeUploadAction>().is_err());
    }
}
