//! Application state shared across handlers.

use roster_core::config::AppConfig;
use roster_metadata::MetadataStore;
use roster_storage::ObjectStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Uploaded picture storage.
    pub storage: Arc<dyn ObjectStore>,
    /// User and picture records.
    pub metadata: Arc<dyn MetadataStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Validates the configuration so a misconfigured server never starts
    /// accepting requests.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Result<Self, String> {
        config.validate()?;

        if !config.auth.secure_cookies {
            tracing::warn!("auth.secure_cookies is disabled; session cookies will be sent over plain HTTP");
        }

        Ok(Self {
            config: Arc::new(config),
            storage,
            metadata,
        })
    }

    /// The process-wide password salt.
    pub fn salt(&self) -> &str {
        &self.config.auth.salt
    }
}
