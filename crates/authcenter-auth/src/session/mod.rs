//! Server-side session tracking, revocation, and periodic cleanup.

pub mod cleanup;
pub mod store;

pub use cleanup::SessionCleanup;
pub use store::SessionStore;
