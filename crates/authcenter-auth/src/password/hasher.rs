//! Argon2id password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use authcenter_core::config::auth::MIN_HASH_WORK_FACTOR;
use authcenter_core::error::AppError;

/// Upper bound on the work factor (1 GiB of memory per hash).
const MAX_HASH_WORK_FACTOR: u32 = 20;

/// Handles password hashing and verification using Argon2id.
///
/// The work factor is the base-2 logarithm of the memory cost in KiB.
/// Digests are self-describing PHC strings, so verification reads the
/// parameters from the digest and accepts hashes made with any factor.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    work_factor: u32,
}

impl PasswordHasher {
    /// Creates a hasher; the factor is clamped to `12..=20`.
    pub fn new(work_factor: u32) -> Self {
        Self {
            work_factor: work_factor.clamp(MIN_HASH_WORK_FACTOR, MAX_HASH_WORK_FACTOR),
        }
    }

    /// The effective work factor.
    pub fn work_factor(&self) -> u32 {
        self.work_factor
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let params = Params::new(1 << self.work_factor, 2, 1, None)
            .map_err(|e| AppError::hashing(format!("Invalid hashing parameters: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::hashing(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(false)` on mismatch; errors only on a malformed digest.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::hashing(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::hashing(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(MIN_HASH_WORK_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authcenter_core::ErrorKind;

    #[test]
    fn test_hash_verify_round_trip() {
        let hasher = PasswordHasher::default();
        let digest = hasher.hash_password("s3cret123").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify_password("s3cret123", &digest).unwrap());
        assert!(!hasher.verify_password("s3cret124", &digest).unwrap());
        assert!(!hasher.verify_password("", &digest).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = PasswordHasher::default();
        let a = hasher.hash_password("same").unwrap();
        let b = hasher.hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_altered_digest_fails_verification() {
        let hasher = PasswordHasher::default();
        let digest = hasher.hash_password("s3cret123").unwrap();

        let pos = digest.len() - 10;
        let mut bytes = digest.into_bytes();
        bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
        let altered = String::from_utf8(bytes).unwrap();

        assert!(!hasher.verify_password("s3cret123", &altered).unwrap());
    }

    #[test]
    fn test_malformed_digest_is_hashing_error() {
        let hasher = PasswordHasher::default();
        let err = hasher.verify_password("pw", "not-a-phc-string").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Hashing);
    }

    #[test]
    fn test_work_factor_floor() {
        assert_eq!(PasswordHasher::new(4).work_factor(), 12);
        assert_eq!(PasswordHasher::new(99).work_factor(), 20);

        let strong = PasswordHasher::new(13).hash_password("pw").unwrap();
        assert!(PasswordHasher::default().verify_password("pw", &strong).unwrap());
    }
}
