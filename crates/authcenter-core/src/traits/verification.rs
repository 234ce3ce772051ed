//! One-time code verification for phone-based login.

use async_trait::async_trait;

use crate::result::AppResult;

/// Verifies a one-time code delivered out of band (e.g. SMS) to a phone handle.
///
/// Delivery and code generation live outside the core; the orchestrator only
/// asks whether a presented code is currently valid for the phone number.
#[async_trait]
pub trait CodeVerifier: Send + Sync + std::fmt::Debug + 'static {
    /// Returns `Ok(true)` when `code` is valid for `phone`. Implementations
    /// should treat a successful verification as consuming the code.
    async fn verify(&self, phone: &str, code: &str) -> AppResult<bool>;
}
