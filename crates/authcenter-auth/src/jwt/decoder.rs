//! JWT token validation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};

use authcenter_core::config::AuthConfig;
use authcenter_core::error::AppError;

use super::claims::{Claims, TokenType};
use super::encoder::SIGNING_ALGORITHM;

/// Validates JWT tokens.
///
/// Verification is stateless: it never consults the session store.
/// Checks run in order: signature and algorithm, issuer, kind, not-before,
/// then expiry (`now >= exp` is expired).
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Time claims are checked against our own clock with exclusive expiry.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_issuer(&[config.jwt_issuer.as_str()]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verifies an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_at(token, TokenType::Access, Utc::now())
    }

    /// Verifies a refresh token.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_at(token, TokenType::Refresh, Utc::now())
    }

    /// Verifies a token of the `expected` kind as of `now`.
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::token_invalid("Invalid token signature")
                }
                jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                    AppError::token_invalid("Unexpected signing algorithm")
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AppError::token_invalid("Unexpected token issuer")
                }
                _ => AppError::token_invalid(format!("Token validation failed: {e}")),
            })?
            .claims;

        if claims.token_type != expected {
            return Err(AppError::token_invalid(format!(
                "Invalid token type: expected {} token",
                expected.as_str()
            )));
        }

        let now_ts = now.timestamp();
        if now_ts < claims.nbf {
            return Err(AppError::token_invalid("Token is not yet valid"));
        }
        if claims.is_expired_at(now) {
            return Err(AppError::token_expired());
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use authcenter_core::ErrorKind;
    use chrono::Duration;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    fn pair() -> (JwtEncoder, JwtDecoder) {
        let config = config();
        (JwtEncoder::new(&config), JwtDecoder::new(&config))
    }

    #[test]
    fn test_access_token_carries_snapshot() {
        let (encoder, decoder) = pair();
        let user_id = Uuid::new_v4();
        let (token, issued) = encoder
            .issue_access_token(
                user_id,
                "alice",
                vec!["User".to_string()],
                vec!["knowledge:READ".to_string()],
            )
            .unwrap();

        let claims = decoder.verify_access_token(&token).unwrap();
        assert_eq!(claims, issued);
        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.iss, "AuthCenter");
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let (encoder, decoder) = pair();
        let now = Utc::now();
        let (token, claims) = encoder
            .issue_access_token_at(Uuid::new_v4(), "alice", vec![], vec![], now)
            .unwrap();
        let exp = claims.expires_at();

        assert!(decoder
            .verify_at(&token, TokenType::Access, exp - Duration::seconds(1))
            .is_ok());
        let err = decoder.verify_at(&token, TokenType::Access, exp).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenExpired);
        let err = decoder
            .verify_at(&token, TokenType::Access, exp + Duration::hours(1))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenExpired);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let (encoder, decoder) = pair();
        let user_id = Uuid::new_v4();
        let (access, _) = encoder
            .issue_access_token(user_id, "alice", vec![], vec![])
            .unwrap();
        let (refresh, refresh_claims) = encoder.issue_refresh_token(user_id).unwrap();

        assert_eq!(
            decoder.verify_refresh_token(&access).unwrap_err().kind,
            ErrorKind::TokenInvalid
        );
        assert_eq!(
            decoder.verify_access_token(&refresh).unwrap_err().kind,
            ErrorKind::TokenInvalid
        );
        let claims = decoder.verify_refresh_token(&refresh).unwrap();
        assert_eq!(claims.session_id(), refresh_claims.jti);
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn test_foreign_algorithm_rejected() {
        let (encoder, decoder) = pair();
        let (_, mut claims) = encoder
            .issue_access_token(Uuid::new_v4(), "alice", vec![], vec![])
            .unwrap();
        claims.roles = vec!["Admin".to_string()];

        let forged = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = decoder.verify_access_token(&forged).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenInvalid);
    }

    #[test]
    fn test_wrong_secret_and_issuer_rejected() {
        let (_, decoder) = pair();
        let other_secret = JwtEncoder::new(&AuthConfig {
            jwt_secret: "other".to_string(),
            ..AuthConfig::default()
        });
        let (token, _) = other_secret
            .issue_access_token(Uuid::new_v4(), "mallory", vec![], vec![])
            .unwrap();
        assert_eq!(
            decoder.verify_access_token(&token).unwrap_err().kind,
            ErrorKind::TokenInvalid
        );

        let other_issuer = JwtEncoder::new(&AuthConfig {
            jwt_issuer: "Elsewhere".to_string(),
            ..config()
        });
        let (token, _) = other_issuer
            .issue_access_token(Uuid::new_v4(), "mallory", vec![], vec![])
            .unwrap();
        assert_eq!(
            decoder.verify_access_token(&token).unwrap_err().kind,
            ErrorKind::TokenInvalid
        );
    }

    #[test]
    fn test_garbage_rejected() {
        let (_, decoder) = pair();
        for token in ["", "abc", "a.b.c"] {
            assert_eq!(
                decoder.verify_access_token(token).unwrap_err().kind,
                ErrorKind::TokenInvalid
            );
        }
    }

    #[test]
    fn test_not_before_enforced() {
        let (encoder, decoder) = pair();
        let future = Utc::now() + Duration::minutes(5);
        let (token, _) = encoder
            .issue_access_token_at(Uuid::new_v4(), "alice", vec![], vec![], future)
            .unwrap();
        assert_eq!(
            decoder.verify_access_token(&token).unwrap_err().kind,
            ErrorKind::TokenInvalid
        );
    }
}
