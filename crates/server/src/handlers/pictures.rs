//! Profile picture upload and download.

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use roster_core::{PictureKey, content_type_for};
use roster_metadata::MetadataError;
use roster_metadata::models::ProfilePictureRow;
use roster_storage::StreamingUpload;
use serde::Serialize;
use time::OffsetDateTime;

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub profile_picture: String,
}

/// What recording an upload did to the user's picture record.
enum RecordOutcome {
    Created,
    Replaced { previous: String },
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Best-effort removal of a stored picture that will not be referenced.
async fn discard_picture(state: &AppState, key: &str) {
    if let Err(e) = state.storage.delete(key).await
        && !e.is_not_found()
    {
        tracing::warn!(key = %key, error = %e, "Failed to remove unreferenced picture");
    }
}

async fn abort_upload(upload: Box<dyn StreamingUpload>, key: &PictureKey) {
    if let Err(e) = upload.abort().await {
        tracing::warn!(key = %key, error = %e, "Failed to abort picture upload");
    }
}

/// Stream one multipart file field into storage under `key`, enforcing `limit`.
async fn store_field(
    state: &AppState,
    key: &PictureKey,
    field: &mut Field<'_>,
    limit: u64,
) -> ApiResult<u64> {
    let mut upload = state.storage.put_stream(key.as_str()).await?;
    let mut total: u64 = 0;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                abort_upload(upload, key).await;
                return Err(multipart_error(e));
            }
        };

        total += chunk.len() as u64;
        if total > limit {
            abort_upload(upload, key).await;
            return Err(ApiError::PayloadTooLarge(format!(
                "File too large. Maximum size is {limit} bytes."
            )));
        }

        if let Err(e) = upload.write(chunk).await {
            abort_upload(upload, key).await;
            return Err(e.into());
        }
    }

    Ok(upload.finish().await?)
}

/// Read the multipart body, storing its single file field.
///
/// `received` is set as soon as a file is fully stored so the caller can
/// clean it up if a later part of the body is rejected.
async fn receive_single_file(
    state: &AppState,
    multipart: &mut Multipart,
    received: &mut Option<PictureKey>,
) -> ApiResult<()> {
    let limit = state.config.server.max_upload_bytes;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        // Plain form fields and empty file inputs are ignored
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };

        if received.is_some() {
            return Err(ApiError::BadRequest(
                "Only one file may be uploaded.".to_string(),
            ));
        }

        let key = PictureKey::generate(Some(&file_name));
        let size = store_field(state, &key, &mut field, limit).await?;
        tracing::debug!(key = %key, size = size, "Picture stored");
        *received = Some(key);
    }

    Ok(())
}

/// Point the user's picture record at `key`, creating it on first upload.
async fn record_upload(
    state: &AppState,
    user_id: &str,
    key: &PictureKey,
    now: OffsetDateTime,
) -> ApiResult<RecordOutcome> {
    if let Some(existing) = state.metadata.get_profile_picture(user_id).await? {
        state
            .metadata
            .update_profile_picture(user_id, key.as_str(), now)
            .await?;
        return Ok(RecordOutcome::Replaced {
            previous: existing.profile_picture,
        });
    }

    let row = ProfilePictureRow {
        id: user_id.to_string(),
        profile_picture: key.as_str().to_string(),
        updated_at: now,
    };

    match state.metadata.create_profile_picture(&row).await {
        Ok(()) => Ok(RecordOutcome::Created),
        // Lost a race with a concurrent first upload: replace theirs instead
        Err(MetadataError::AlreadyExists(_)) => {
            let existing = state
                .metadata
                .get_profile_picture(user_id)
                .await?
                .ok_or_else(|| ApiError::Internal("picture record vanished".to_string()))?;
            state
                .metadata
                .update_profile_picture(user_id, key.as_str(), now)
                .await?;
            Ok(RecordOutcome::Replaced {
                previous: existing.profile_picture,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /upload/{id}
pub async fn upload_picture(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    auth.authorize(&id)?;
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut received = None;
    if let Err(e) = receive_single_file(&state, &mut multipart, &mut received).await {
        if let Some(key) = received {
            discard_picture(&state, key.as_str()).await;
        }
        return Err(e);
    }
    let key = received.ok_or_else(|| ApiError::BadRequest("No file uploaded.".to_string()))?;

    let now = OffsetDateTime::now_utc();
    let outcome = match record_upload(&state, &id, &key, now).await {
        Ok(outcome) => outcome,
        Err(e) => {
            discard_picture(&state, key.as_str()).await;
            return Err(e);
        }
    };

    let message = match outcome {
        RecordOutcome::Created => {
            tracing::info!(user_id = %id, key = %key, "Profile picture uploaded");
            "Profile picture uploaded successfully."
        }
        RecordOutcome::Replaced { previous } => {
            match state.storage.delete(&previous).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    tracing::warn!(user_id = %id, key = %previous, "Previous picture was already missing");
                }
                Err(e) => {
                    // Put the record back so it never points at a half-replaced state
                    if let Err(restore) = state
                        .metadata
                        .update_profile_picture(&id, &previous, now)
                        .await
                    {
                        tracing::error!(user_id = %id, error = %restore, "Failed to restore picture record");
                    }
                    discard_picture(&state, key.as_str()).await;
                    return Err(e.into());
                }
            }
            tracing::info!(user_id = %id, key = %key, previous = %previous, "Profile picture replaced");
            "Profile picture updated successfully."
        }
    };

    Ok(Json(UploadResponse {
        message,
        profile_picture: key.into_string(),
    }))
}

/// GET /profilepicture/{id}
pub async fn get_picture(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    auth.authorize(&id)?;

    let not_found = || ApiError::NotFound("Profile picture not found.".to_string());

    let record = state
        .metadata
        .get_profile_picture(&id)
        .await?
        .ok_or_else(not_found)?;
    let key = record.profile_picture;

    let meta = state.storage.head(&key).await.map_err(|e| {
        if e.is_not_found() {
            tracing::warn!(user_id = %id, key = %key, "Picture record points at a missing file");
            not_found()
        } else {
            e.into()
        }
    })?;
    let stream = state
        .storage
        .get_stream(&key)
        .await
        .map_err(|e| if e.is_not_found() { not_found() } else { e.into() })?;

    let body = Body::from_stream(
        stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string()))),
    );

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type_for(&key).to_string()),
            (CONTENT_LENGTH, meta.size.to_string()),
            (CACHE_CONTROL, "private, no-cache".to_string()),
        ],
        body,
    )
        .into_response())
}
