//! Session authentication and ownership checks.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use roster_core::UserId;
use tower_sessions::Session;
use tracing::Instrument;
use uuid::Uuid;

/// Session key under which the logged-in user's ID is stored.
pub const SESSION_USER_KEY: &str = "user_id";

/// Maximum length for trace IDs.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value, keeping only printable
    /// ASCII and at most `MAX_TRACE_ID_LEN` characters.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic())
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

/// The user behind the current session, re-resolved from the store on every
/// request.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub username: String,
}

impl AuthenticatedUser {
    /// Permit access only to the caller's own resources.
    pub fn authorize(&self, route_id: &str) -> ApiResult<()> {
        if self.id.matches(route_id) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.id,
                username = %self.username,
                route_id = %route_id,
                "Ownership check failed"
            );
            Err(ApiError::Forbidden("Forbidden".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized access".to_string()))
    }
}

/// Resolve the session's user ID to a user record.
///
/// A session whose user no longer resolves is treated as unauthenticated.
async fn resolve_session_user(
    state: &AppState,
    session: &Session,
) -> ApiResult<Option<AuthenticatedUser>> {
    let Some(user_id) = session.get::<String>(SESSION_USER_KEY).await? else {
        return Ok(None);
    };

    match state.metadata.get_user(&user_id).await? {
        Some(row) => Ok(Some(AuthenticatedUser {
            id: UserId::from_stored(row.id),
            username: row.username,
        })),
        None => {
            tracing::warn!(user_id = %user_id, "Session refers to unknown user");
            Ok(None)
        }
    }
}

/// Authentication middleware: attaches the trace ID and, when the session
/// carries a resolvable user, an [`AuthenticatedUser`] extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = req
        .headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_default();
    let trace_id_str = trace_id.0.clone();
    req.extensions_mut().insert(trace_id);

    if let Some(user) = resolve_session_user(&state, &session).await? {
        req.extensions_mut().insert(user);
    }

    let response = next
        .run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await;

    Ok(response)
}
