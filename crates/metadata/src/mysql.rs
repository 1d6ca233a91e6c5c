//! MySQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult, map_unique_violation};
use crate::models::*;
use crate::repos::{PictureRepo, UserRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, Pool};
use std::str::FromStr;
use time::OffsetDateTime;

/// MySQL schema, one statement per entry (prepared statements cannot batch).
const MYSQL_SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(255) PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        username VARCHAR(255) UNIQUE NOT NULL,
        password VARCHAR(255) NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profile_pictures (
        id VARCHAR(255) PRIMARY KEY,
        profile_picture VARCHAR(255) NOT NULL,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (id) REFERENCES users(id)
    )
    "#,
];

/// MySQL-based metadata store.
pub struct MySqlStore {
    pool: Pool<MySql>,
}

impl MySqlStore {
    /// Create a new MySQL store from a connection URL.
    pub async fn from_url(url: &str, max_connections: u32) -> MetadataResult<Self> {
        let opts = MySqlConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections).await
    }

    /// Create a new MySQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, e.g. the password via
    /// an environment variable.
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        max_connections: u32,
    ) -> MetadataResult<Self> {
        let mut opts = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            "Connecting to MySQL with individual parameters"
        );

        Self::connect(opts, max_connections).await
    }

    async fn connect(opts: MySqlConnectOptions, max_connections: u32) -> MetadataResult<Self> {
        // Requests beyond pool capacity queue at the pool.
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }
}

#[async_trait]
impl MetadataStore for MySqlStore {
    async fn migrate(&self) -> MetadataResult<()> {
        for statement in MYSQL_SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Users table created or already exists");
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepo for MySqlStore {
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
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, username, password, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_user_by_username(&self, username: &str) -> MetadataResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, username, password, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl PictureRepo for MySqlStore {
    async fn get_profile_picture(&self, user_id: &str) -> MetadataResult<Option<ProfilePictureRow>> {
        let row = sqlx::query_as::<_, ProfilePictureRow>(
            "SELECT id, profile_picture, updated_at FROM profile_pictures WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_profile_picture(&self, picture: &ProfilePictureRow) -> MetadataResult<()> {
        sqlx::query("INSERT INTO profile_pictures (id, profile_picture, updated_at) VALUES (?, ?, ?)")
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
        // MySQL reports "rows changed" rather than "rows matched", so an update
        // to the same path would look like a miss. Keys are random, so a
        // repeated path only happens on a genuine miss.
        let result =
            sqlx::query("UPDATE profile_pictures SET profile_picture = ?, updated_at = ? WHERE id = ?")
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
