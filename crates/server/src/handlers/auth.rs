//! Signup, login and logout endpoints.

use crate::auth::SESSION_USER_KEY;
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonOrForm;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use roster_core::{NewUser, UserId, hash_password, verify_password};
use roster_metadata::MetadataError;
use roster_metadata::models::UserRow;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_sessions::Session;

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: UserId,
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<SignupRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let new_user = NewUser::parse(&req.name, &req.username, &req.password)?;

    if state
        .metadata
        .get_user_by_username(&new_user.username)
        .await?
        .is_some()
    {
        return Err(ApiError::UsernameTaken);
    }

    let id = UserId::generate();
    let row = UserRow {
        id: id.as_str().to_string(),
        name: new_user.name,
        username: new_user.username,
        password: hash_password(&new_user.password, state.salt()),
        created_at: OffsetDateTime::now_utc(),
    };

    // A concurrent signup can pass the check above; the unique key decides.
    match state.metadata.create_user(&row).await {
        Ok(()) => {}
        Err(MetadataError::AlreadyExists(_)) => return Err(ApiError::UsernameTaken),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %id, username = %row.username, "User signed up");

    Ok(Json(MessageResponse {
        message: "Signup successful.",
    }))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonOrForm(req): JsonOrForm<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Missing credentials".to_string()));
    }

    let user = state
        .metadata
        .get_user_by_username(req.username.trim())
        .await?
        .filter(|row| verify_password(&req.password, state.salt(), &row.password));

    let Some(user) = user else {
        tracing::info!(username = %req.username, "Login failed");
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    };

    // Fresh session ID on privilege change
    session.cycle_id().await?;
    session.insert(SESSION_USER_KEY, &user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful.",
        user: UserId::from_stored(user.id),
    }))
}

/// GET /logout
pub async fn logout(session: Session) -> ApiResult<Json<MessageResponse>> {
    if let Some(user_id) = session.get::<String>(SESSION_USER_KEY).await? {
        tracing::info!(user_id = %user_id, "User logged out");
    }
    session.flush().await?;

    Ok(Json(MessageResponse {
        message: "Logout successful.",
    }))
}
