use crate::error::{AppError, AppResult};
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub database_min_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub database_connection_timeout: u64,

    pub redis_url: String,

    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default = "default_bulk_approval_max_batch")]
    pub bulk_approval_max_batch: usize,
    #[serde(default = "default_export_max_days")]
    pub export_max_days: i64,
    #[serde(default)]
    pub business_utc_offset_minutes: i32,
    #[serde(default)]
    pub lead_sources: Option<Vec<String>>,

    #[serde(default = "default_activity_feed_key")]
    pub activity_feed_key: String,
    #[serde(default = "default_activity_feed_max_len")]
    pub activity_feed_max_len: isize,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Limits applied by the lead engine itself.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub bulk_approval_max_batch: usize,
    pub export_max_days: i64,
    pub business_utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bulk_approval_max_batch: default_bulk_approval_max_batch(),
            export_max_days: default_export_max_days(),
            business_utc_offset_minutes: 0,
        }
    }
}

impl EngineConfig {
    /// Today's date in the business timezone.
    pub fn today(&self) -> NaiveDate {
        let offset = FixedOffset::east_opt(self.business_utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        Utc::now().with_timezone(&offset).date_naive()
    }
}

#[derive(Clone, Debug)]
pub struct ActivityConfig {
    pub feed_key: String,
    pub max_len: isize,
}

// Default value functions
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connection_timeout() -> u64 {
    30
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_secret() -> String {
    "your-secret-key".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_bulk_approval_max_batch() -> usize {
    500
}
fn default_export_max_days() -> i64 {
    366
}
fn default_activity_feed_key() -> String {
    "activity:feed".to_string()
}
fn default_activity_feed_max_len() -> isize {
    1000
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()
            .map_err(|e| AppError::Config(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.database_max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be > 0".to_string(),
            ));
        }

        if self.database_min_connections > self.database_max_connections {
            return Err(AppError::Config(
                "DATABASE_MIN_CONNECTIONS cannot be greater than DATABASE_MAX_CONNECTIONS"
                    .to_string(),
            ));
        }

        if self.jwt_secret == "your-secret-key" {
            return Err(AppError::Config(
                "JWT_SECRET must be set to a secure value".to_string(),
            ));
        }

        if self.bulk_approval_max_batch == 0 {
            return Err(AppError::Config(
                "BULK_APPROVAL_MAX_BATCH must be > 0".to_string(),
            ));
        }

        if self.export_max_days <= 0 {
            return Err(AppError::Config("EXPORT_MAX_DAYS must be > 0".to_string()));
        }

        if FixedOffset::east_opt(self.business_utc_offset_minutes.saturating_mul(60)).is_none() {
            return Err(AppError::Config(
                "BUSINESS_UTC_OFFSET_MINUTES must be within +/- 24 hours".to_string(),
            ));
        }

        if self.activity_feed_max_len <= 0 {
            return Err(AppError::Config(
                "ACTIVITY_FEED_MAX_LEN must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connection_timeout: self.database_connection_timeout,
        }
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.server_host.clone(),
            port: self.server_port,
            cors_origins: self.cors_origins.clone(),
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format.clone(),
        }
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            bulk_approval_max_batch: self.bulk_approval_max_batch,
            export_max_days: self.export_max_days,
            business_utc_offset_minutes: self.business_utc_offset_minutes,
        }
    }

    pub fn activity(&self) -> ActivityConfig {
        ActivityConfig {
            feed_key: self.activity_feed_key.clone(),
            max_len: self.activity_feed_max_len,
        }
    }
}
