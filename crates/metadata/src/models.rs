//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;

/// User record.
///
/// `password` holds the encoded credential (`<salt>$<hex>`), never plaintext.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String,
    pub created_at: OffsetDateTime,
}

/// Profile picture record, one per user at most.
#[derive(Debug, Clone, FromRow)]
pub struct ProfilePictureRow {
    /// Owning user's ID.
    pub id: String,
    /// Storage key of the current picture file.
    pub profile_picture: String,
    pub updated_at: OffsetDateTime,
}
