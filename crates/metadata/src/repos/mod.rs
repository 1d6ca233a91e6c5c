//! Repository traits for metadata operations.

pub mod pictures;
pub mod users;

pub use pictures::PictureRepo;
pub use users::UserRepo;
