//! In-memory adapters for the collaborator traits.
//!
//! These back the integration tests and the CLI's `--memory` mode. They
//! honour the same uniqueness and status rules as the PostgreSQL adapters.

pub mod role;
pub mod session;
pub mod user;

pub use role::MemoryRoleRepository;
pub use session::MemorySessionRepository;
pub use user::MemoryUserRepository;
