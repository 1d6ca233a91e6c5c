//! Core domain types and shared logic for Roster.
//!
//! This crate defines the pieces every other crate agrees on:
//! - Configuration types
//! - Password hashing
//! - User identifiers and signup validation
//! - Profile picture naming

pub mod config;
pub mod credential;
pub mod error;
pub mod picture;
pub mod user;

pub use credential::{hash_password, verify_password};
pub use error::{Error, Result};
pub use picture::{PictureKey, content_type_for};
pub use user::{NewUser, UserId};

/// Maximum profile picture size: 1 MiB
pub const MAX_PICTURE_SIZE: u64 = 1024 * 1024;
