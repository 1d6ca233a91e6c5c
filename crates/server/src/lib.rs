//! HTTP API server for Roster.
//!
//! This crate provides the web surface:
//! - Signup, login and logout with cookie sessions
//! - Owner-only user and profile data
//! - Profile picture upload and download

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthenticatedUser, TraceId};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
