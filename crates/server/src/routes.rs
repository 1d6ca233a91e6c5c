//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 16 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.config.server.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let routes = Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/user/{id}", get(handlers::get_user))
        .route("/userprofiledata/{id}", get(handlers::get_profile_data))
        .route(
            "/upload/{id}",
            post(handlers::upload_picture).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/profilepicture/{id}", get(handlers::get_picture))
        .fallback(handlers::not_found);

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.auth.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(state.config.auth.session_expiry()));

    // Layers run outermost first: TraceLayer -> sessions -> auth -> handler
    routes
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
