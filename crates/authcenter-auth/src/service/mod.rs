//! The authentication orchestrator and its request/response types.

pub mod auth;
pub mod types;

pub use auth::AuthService;
pub use types::{LoginMode, LoginRequest, RegisterRequest, TokenData, VerifyResult, VerifyTokenRequest};
