use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postpix_core::{DatabaseConfig, PersistedPost, PostRecord};
use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use tokio::sync::Mutex;

use super::schema::CREATE_POSTS_TABLE;
use crate::error::DbError;

const ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Append-only store for post records
///
/// There is no update or delete; every processed image appends exactly one row.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Create the database and `posts` table if they do not exist.
    async fn ensure_schema(&self) -> Result<(), DbError>;

    /// Append one row. `created_at` is assigned by the database.
    async fn insert(&self, record: &PostRecord) -> Result<PersistedPost, DbError>;

    /// Close the connection if one is open. Safe to call more than once.
    async fn close(&self);
}

/// PostgreSQL implementation of [`PostStore`]
///
/// The connection is opened on first use and held until [`PostStore::close`].
pub struct PgPostStore {
    config: DatabaseConfig,
    pool: Mutex<Option<PgPool>>,
}

impl PgPostStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: Mutex::new(None),
        }
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database)
    }

    async fn pool(&self) -> Result<PgPool, sqlx::Error> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            "Connecting to database..."
        );
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(self.connect_options())
            .await?;

        *guard = Some(pool.clone());
        Ok(pool)
    }

    /// PostgreSQL does not create databases implicitly.
    async fn ensure_database(&self) -> Result<(), sqlx::Error> {
        let url = self.config.connection_url();
        if Postgres::database_exists(&url).await? {
            return Ok(());
        }

        if let Err(e) = Postgres::create_database(&url).await {
            // Another worker may have created it between the check and the create.
            if !Postgres::database_exists(&url).await.unwrap_or(false) {
                return Err(e);
            }
            tracing::debug!(error = %e, "Database appeared concurrently");
            return Ok(());
        }

        tracing::info!(database = %self.config.database, "Database created");
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn ensure_schema(&self) -> Result<(), DbError> {
        self.ensure_database().await.map_err(DbError::Schema)?;

        let pool = self.pool().await.map_err(DbError::Schema)?;
        sqlx::query(CREATE_POSTS_TABLE)
            .execute(&pool)
            .await
            .map_err(DbError::Schema)?;

        tracing::debug!("posts table ready");
        Ok(())
    }

    async fn insert(&self, record: &PostRecord) -> Result<PersistedPost, DbError> {
        let pool = self.pool().await.map_err(DbError::Connect)?;

        // Use dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
        let (id, created_at) = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            r#"
            INSERT INTO posts (image_url, title, text, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(&record.image_url)
        .bind(&record.title)
        .bind(&record.text)
        .bind(record.tags_csv())
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                image_url = %record.image_url,
                "Failed to insert post"
            );
            DbError::Query(e)
        })?;

        Ok(PersistedPost {
            id: i64::from(id),
            created_at,
        })
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            pool.close().await;
            tracing::debug!("Database connection closed");
        }
    }
}
