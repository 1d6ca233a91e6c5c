//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult, map_unique_violation};
use crate::repos::{PictureRepo, UserRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: UserRepo + PictureRepo + Send + Sync {
    /// Create tables if they do not exist yet.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store, creating the database file and schema as needed.
    pub async fn new(path: impl AsRef<Path>, max_connections: u32) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(
            path = %path.display(),
            max_connections = max_connections,
            "SQLite metadata store ready"
        );

        Ok(store)
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use time::OffsetDateTime;

    #[async_trait]
    impl UserRepo for SqliteStore {
        async fn create_user(&self, user: &UserRow) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO users (id, name, username, password, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.username)
            .bind(&user.password)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, || format!("username '{}' is already taken", user.username))
            })?;
            Ok(())
        }

        async fn get_user(&self, id: &str) -> MetadataResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_user_by_username(&self, username: &str) -> MetadataResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }
    }

    #[async_trait]
    impl PictureRepo for SqliteStore {
        async fn get_profile_picture(
            &self,
            user_id: &str,
        ) -> MetadataResult<Option<ProfilePictureRow>> {
            let row = sqlx::query_as::<_, ProfilePictureRow>(
                "SELECT * FROM profile_pictures WHERE id = ?",
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn create_profile_picture(&self, picture: &ProfilePictureRow) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO profile_pictures (id, profile_picture, updated_at) VALUES (?, ?, ?)",
            )
            .bind(&picture.id)
            .bind(&picture.profile_picture)
            .bind(picture.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, || {
                    format!("profile picture for user {} already exists", picture.id)
                })
            })?;
            Ok(())
        }

        async fn update_profile_picture(
            &self,
            user_id: &str,
            profile_picture: &str,
            updated_at: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                "UPDATE profile_pictures SET profile_picture = ?, updated_at = ? WHERE id = ?",
            )
            .bind(profile_picture)
            .bind(updated_at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "profile picture for user {user_id} not found"
                )));
            }
            Ok(())
        }
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profile_pictures (
    id TEXT PRIMARY KEY REFERENCES users(id),
    profile_picture TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
