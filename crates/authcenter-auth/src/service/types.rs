//! Request and response structures for [`AuthService`](super::AuthService).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use authcenter_core::error::AppError;
use authcenter_entity::session::DeviceInfo;

/// Returns the trimmed value when present and non-empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Registration input. Only `username` is mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Primary handle.
    pub username: String,
    /// Optional email handle.
    #[serde(default)]
    pub email: Option<String>,
    /// Optional phone handle.
    #[serde(default)]
    pub phone: Option<String>,
    /// Optional password; phone-only principals register without one.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

/// How a login request identifies the principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    /// Phone handle plus one-time code.
    Phone,
    /// Username plus password.
    Username,
    /// Email plus password. Also selected by an empty mode.
    Email,
    /// Username, failing that email, plus password.
    Auto,
}

impl LoginMode {
    /// Return the mode as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Username => "username",
            Self::Email => "email",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for LoginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoginMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phone" => Ok(Self::Phone),
            "username" => Ok(Self::Username),
            "email" | "" => Ok(Self::Email),
            "auto" => Ok(Self::Auto),
            _ => Err(AppError::invalid_request(format!(
                "Unsupported login type: '{s}'"
            ))),
        }
    }
}

/// Login input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login mode: `phone`, `username`, `email`, `auto`, or empty for email.
    #[serde(rename = "type", default)]
    pub login_type: String,
    /// Username (also the `auto` identifier).
    #[serde(default)]
    pub username: Option<String>,
    /// Email (the `auto` identifier when no username is given).
    #[serde(default)]
    pub email: Option<String>,
    /// Phone handle.
    #[serde(default)]
    pub phone: Option<String>,
    /// Password for the password modes.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// One-time code for phone mode.
    #[serde(default, skip_serializing)]
    pub code: Option<String>,
    /// Client metadata recorded on the session.
    #[serde(default)]
    pub device: DeviceInfo,
    /// Identity the login limiter keys on. Falls back to the device address.
    #[serde(default)]
    pub client_key: Option<String>,
}

impl LoginRequest {
    /// Key for the login limiter, if the caller supplied one.
    pub fn client_identity(&self) -> Option<&str> {
        non_empty(&self.client_key).or_else(|| non_empty(&self.device.ip_address))
    }
}

/// Token verification input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyTokenRequest {
    /// Access token to verify.
    pub token: String,
    /// Resource for an optional access decision.
    #[serde(default)]
    pub resource: Option<String>,
    /// Action for an optional access decision.
    #[serde(default)]
    pub action: Option<String>,
}

/// Issued token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Always `Bearer`.
    pub token_type: String,
    /// Absolute access token expiry.
    pub expires_at: DateTime<Utc>,
    /// The authenticated principal.
    pub user_id: Uuid,
}

/// Outcome of token verification.
///
/// A failed verification still yields a result: `valid` is `false` and
/// `error` holds the cause. Callers must check both.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyResult {
    /// Whether the token verified.
    pub valid: bool,
    /// Principal from the claims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    /// Display name from the claims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Role names from the claims.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    /// Permission keys from the claims.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    /// Access decision, present when both resource and action were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_access: Option<bool>,
    /// Why verification failed.
    #[serde(skip)]
    pub error: Option<AppError>,
}

impl VerifyResult {
    /// A failed verification carrying its cause.
    pub fn invalid(error: AppError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Converts into a `Result`, surfacing the failure cause.
    pub fn into_result(self) -> Result<Self, AppError> {
        match (&self.error, self.valid) {
            (Some(e), _) => Err(e.clone()),
            (None, false) => Err(AppError::token_invalid("Token verification failed")),
            (None, true) => Ok(self),
        }
    }
}
