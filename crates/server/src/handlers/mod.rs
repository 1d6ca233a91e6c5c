//! HTTP request handlers.

pub mod auth;
pub mod fallback;
pub mod pictures;
pub mod users;

pub use auth::*;
pub use fallback::*;
pub use pictures::*;
pub use users::*;
