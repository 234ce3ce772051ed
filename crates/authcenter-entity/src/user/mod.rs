//! User (principal) domain entities.

pub mod grant;
pub mod model;
pub mod status;

pub use grant::RoleGrant;
pub use model::{CreateUser, User};
pub use status::UserStatus;
