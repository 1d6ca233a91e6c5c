//! Metadata store abstraction and implementations for Roster.
//!
//! This crate owns the relational data model:
//! - User records (unique usernames, encoded credentials)
//! - Profile picture records (one per user)

pub mod error;
pub mod models;
pub mod mysql;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use mysql::MySqlStore;
pub use store::{MetadataStore, SqliteStore};

use roster_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    config.validate().map_err(MetadataError::Config)?;

    match config {
        MetadataConfig::Sqlite {
            path,
            max_connections,
        } => {
            let store = SqliteStore::new(path, *max_connections).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
        MetadataConfig::Mysql {
            url,
            host,
            port,
            username,
            password,
            database,
            max_connections,
        } => {
            let store = if let Some(url) = url {
                tracing::info!("Connecting to MySQL using connection URL");
                MySqlStore::from_url(url, *max_connections).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                MySqlStore::from_params(
                    host,
                    port.unwrap_or(3306),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *max_connections,
                )
                .await?
            } else {
                return Err(MetadataError::Config(
                    "mysql config requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
