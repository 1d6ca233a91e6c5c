//! Profile picture repository.

use crate::error::MetadataResult;
use crate::models::ProfilePictureRow;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for profile picture records.
#[async_trait]
pub trait PictureRepo: Send + Sync {
    /// Get the picture record for a user.
    async fn get_profile_picture(&self, user_id: &str)
    -> MetadataResult<Option<ProfilePictureRow>>;

    /// Create the picture record for a user. Fails with `AlreadyExists` if one exists.
    async fn create_profile_picture(&self, picture: &ProfilePictureRow) -> MetadataResult<()>;

    /// Point an existing record at a new file. Fails with `NotFound` if there is no record.
    async fn update_profile_picture(
        &self,
        user_id: &str,
        profile_picture: &str,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<()>;
}
