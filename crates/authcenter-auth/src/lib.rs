//! # authcenter-auth
//!
//! Credential issuance, validation and revocation for AuthCenter, plus
//! role-based permission resolution.
//!
//! ## Modules
//!
//! - `password`: Argon2id password hashing and policy enforcement
//! - `jwt`: signed access/refresh token issuance and verification
//! - `session`: server-side session store and periodic cleanup
//! - `rbac`: permission aggregation across role grants
//! - `ratelimit`: sliding-window login and request throttling
//! - `verification`: one-time code verifiers for phone login
//! - `service`: the orchestrator composing all of the above

pub mod jwt;
pub mod password;
pub mod ratelimit;
pub mod rbac;
pub mod service;
pub mod session;
pub mod verification;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenType};
pub use password::{PasswordHasher, PasswordValidator};
pub use ratelimit::{RateLimiters, SlidingWindowLimiter};
pub use rbac::{PermissionResolver, ResolvedAccess};
pub use service::AuthService;
pub use session::{SessionCleanup, SessionStore};
pub use verification::{DisabledCodeVerifier, MemoryCodeVerifier};
