//! User repository.

use crate::error::MetadataResult;
use crate::models::UserRow;
use async_trait::async_trait;

/// Repository for user operations.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Create a user.
    ///
    /// Fails with `AlreadyExists` if the username (or ID) is taken; the unique
    /// index is authoritative even when callers checked beforehand.
    async fn create_user(&self, user: &UserRow) -> MetadataResult<()>;

    /// Get a user by ID.
    async fn get_user(&self, id: &str) -> MetadataResult<Option<UserRow>>;

    /// Get a user by username.
    async fn get_user_by_username(&self, username: &str) -> MetadataResult<Option<UserRow>>;
}
