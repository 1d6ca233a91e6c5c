//! User and profile data endpoints.

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use roster_metadata::models::UserRow;
use serde::Serialize;

/// A user as exposed over the API. Never carries the credential.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub username: String,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
        }
    }
}

/// Response for GET /user/{id}.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserView,
}

/// Profile data: the user plus their picture, if any.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserView,
    pub profile_picture: Option<String>,
}

/// Response for GET /userprofiledata/{id}.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileView,
}

async fn load_user(state: &AppState, id: &str) -> ApiResult<UserRow> {
    state
        .metadata
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
}

/// GET /user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    auth.authorize(&id)?;

    let user = load_user(&state, &id).await?;
    Ok(Json(UserResponse { user: user.into() }))
}

/// GET /userprofiledata/{id}
pub async fn get_profile_data(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    auth.authorize(&id)?;

    let user = load_user(&state, &id).await?;
    let picture = state.metadata.get_profile_picture(&id).await?;

    Ok(Json(ProfileResponse {
        profile: ProfileView {
            user: user.into(),
            profile_picture: picture.map(|p| p.profile_picture),
        },
    }))
}
