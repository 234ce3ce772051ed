//! One-time code verifiers for phone login.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use authcenter_core::result::AppResult;
use authcenter_core::traits::CodeVerifier;

/// Rejects every code. Used when no SMS provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCodeVerifier;

#[async_trait]
impl CodeVerifier for DisabledCodeVerifier {
    async fn verify(&self, _phone: &str, _code: &str) -> AppResult<bool> {
        Ok(false)
    }
}

/// Holds one outstanding code per phone; a code is consumed on success.
#[derive(Debug, Default)]
pub struct MemoryCodeVerifier {
    codes: DashMap<String, String>,
}

impl MemoryCodeVerifier {
    /// Creates an empty verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `code` for `phone`, replacing any earlier code.
    pub fn issue(&self, phone: &str, code: &str) {
        self.codes.insert(phone.to_string(), code.to_string());
        debug!(phone = %phone, "Verification code issued");
    }
}

#[async_trait]
impl CodeVerifier for MemoryCodeVerifier {
    async fn verify(&self, phone: &str, code: &str) -> AppResult<bool> {
        Ok(self
            .codes
            .remove_if(phone, |_, expected| expected == code)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_code_is_single_use() {
        let verifier = MemoryCodeVerifier::new();
        verifier.issue("+15550100", "123456");

        assert!(!verifier.verify("+15550100", "000000").await.unwrap());
        assert!(verifier.verify("+15550100", "123456").await.unwrap());
        assert!(!verifier.verify("+15550100", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_rejects() {
        assert!(!DisabledCodeVerifier.verify("+15550100", "123456").await.unwrap());
    }
}
