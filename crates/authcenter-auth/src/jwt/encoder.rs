//! JWT token creation with configurable signing and TTL.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use authcenter_core::config::AuthConfig;
use authcenter_core::error::AppError;

use super::claims::{Claims, TokenType};

/// The only algorithm tokens are signed with and accepted under.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Creates signed JWT access and refresh tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            access_ttl: Duration::seconds(config.access_ttl_seconds()),
            refresh_ttl: Duration::seconds(config.refresh_ttl_seconds()),
        }
    }

    /// Access token lifetime in seconds.
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Issues an access token embedding the given role and permission
    /// snapshot. Permissions must already be deduplicated.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        username: &str,
        roles: Vec<String>,
        permissions: Vec<String>,
    ) -> Result<(String, Claims), AppError> {
        self.issue_access_token_at(user_id, username, roles, permissions, Utc::now())
    }

    /// [`issue_access_token`](Self::issue_access_token) with an explicit clock.
    pub fn issue_access_token_at(
        &self,
        user_id: Uuid,
        username: &str,
        roles: Vec<String>,
        permissions: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims), AppError> {
        let claims = Claims {
            sub: user_id,
            username: Some(username.to_string()),
            roles,
            permissions,
            token_type: TokenType::Access,
            jti: Uuid::new_v4(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    /// Issues a refresh token whose fresh `jti` identifies the session.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<(String, Claims), AppError> {
        self.issue_refresh_token_at(user_id, Utc::now())
    }

    /// [`issue_refresh_token`](Self::issue_refresh_token) with an explicit clock.
    pub fn issue_refresh_token_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims), AppError> {
        let claims = Claims {
            sub: user_id,
            username: None,
            roles: Vec::new(),
            permissions: Vec::new(),
            token_type: TokenType::Refresh,
            jti: Uuid::new_v4(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key).map_err(|e| {
            AppError::internal(format!(
                "Failed to encode {} token: {e}",
                claims.token_type.as_str()
            ))
        })
    }
}
