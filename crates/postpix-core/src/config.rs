//! Configuration module
//!
//! Settings are read once at start-up from the environment (after loading an optional
//! `.env` file) and are read-only afterwards.

use std::env;
use std::fmt;

use anyhow::Context;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::storage_types::StorageBackend;

// Common constants
const DEFAULT_AWS_REGION: &str = "us-east-1";
const DEFAULT_DB_PORT: u16 = 5432;
/// SQS rejects long-poll waits above 20 seconds.
const MAX_RECEIVE_WAIT_SECS: i32 = 20;
const DEFAULT_MAX_MESSAGES_PER_RUN: usize = 1;

/// Relational store connection parameters
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DatabaseConfig {
    /// Connection URL for the configured database.
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            utf8_percent_encode(&self.user, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.password, NON_ALPHANUMERIC),
            self.host,
            self.port,
            utf8_percent_encode(&self.database, NON_ALPHANUMERIC),
        )
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Object store gateway settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (LocalStack, MinIO)
    pub endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

/// Worker process configuration
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub environment: String,
    pub queue_url: String,
    pub aws_region: String,
    pub aws_endpoint: Option<String>,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    /// Bucket derivatives are written to; defaults to each item's source bucket.
    pub output_bucket: Option<String>,
    pub receive_wait_secs: i32,
    pub visibility_timeout_secs: Option<i32>,
    pub max_messages_per_run: usize,
    pub log_json: bool,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let queue_url = non_empty("SQS_URL")
            .or_else(|| non_empty("QUEUE_URL"))
            .context("SQS_URL must be set")?;

        let aws_region = non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.to_string());
        let aws_endpoint = non_empty("AWS_ENDPOINT_URL");

        let backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            region: non_empty("S3_REGION").unwrap_or_else(|| aws_region.clone()),
            endpoint: non_empty("S3_ENDPOINT").or_else(|| aws_endpoint.clone()),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
        };

        let database = DatabaseConfig {
            host: non_empty("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: match non_empty("DB_PORT") {
                Some(port) => port
                    .parse::<u16>()
                    .with_context(|| format!("DB_PORT '{}' is not a valid port", port))?,
                None => DEFAULT_DB_PORT,
            },
            user: non_empty("DB_USER").context("DB_USER must be set")?,
            password: var("DB_PASSWORD").unwrap_or_default(),
            database: non_empty("DB_NAME").context("DB_NAME must be set")?,
        };

        let receive_wait_secs = non_empty("RECEIVE_WAIT_SECS")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(MAX_RECEIVE_WAIT_SECS)
            .clamp(0, MAX_RECEIVE_WAIT_SECS);

        let visibility_timeout_secs = match non_empty("VISIBILITY_TIMEOUT_SECS") {
            Some(v) => Some(
                v.parse::<i32>()
                    .with_context(|| format!("VISIBILITY_TIMEOUT_SECS '{}' is not a number", v))?,
            ),
            None => None,
        };

        let max_messages_per_run = non_empty("MAX_MESSAGES_PER_RUN")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_MESSAGES_PER_RUN);

        let log_json = non_empty("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = WorkerConfig {
            environment,
            queue_url,
            aws_region,
            aws_endpoint,
            storage,
            database,
            output_bucket: non_empty("OUTPUT_BUCKET"),
            receive_wait_secs,
            visibility_timeout_secs,
            max_messages_per_run,
            log_json,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_messages_per_run == 0 {
            return Err(anyhow::anyhow!("MAX_MESSAGES_PER_RUN must be at least 1"));
        }

        if let Some(timeout) = self.visibility_timeout_secs {
            // SQS allows 0..=43200 seconds (12 hours).
            if !(0..=43_200).contains(&timeout) {
                return Err(anyhow::anyhow!(
                    "VISIBILITY_TIMEOUT_SECS must be between 0 and 43200"
                ));
            }
        }

        if self.storage.backend == StorageBackend::Local
            && (self.storage.local_storage_path.is_none()
                || self.storage.local_storage_base_url.is_none())
        {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL"
            ));
        }

        Ok(())
    }
}
