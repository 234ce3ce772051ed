//! Authentication orchestrator: register, login, refresh, verify, logout.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use authcenter_core::config::AppConfig;
use authcenter_core::deadline::with_deadline;
use authcenter_core::error::{AppError, ErrorKind};
use authcenter_core::result::AppResult;
use authcenter_core::traits::CodeVerifier;
use authcenter_database::repositories::{RoleRepository, UserRepository};
use authcenter_entity::session::{CreateSession, DeviceInfo, Session};
use authcenter_entity::user::{CreateUser, RoleGrant, User, UserStatus};

use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::ratelimit::RateLimiters;
use crate::rbac::PermissionResolver;
use crate::session::SessionStore;

use super::types::{
    LoginMode, LoginRequest, RegisterRequest, TokenData, VerifyResult, VerifyTokenRequest,
    non_empty,
};

/// Composes hashing, tokens, sessions, permissions and throttling into the
/// public authentication API. Owns no persisted state of its own.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    sessions: Arc<SessionStore>,
    resolver: PermissionResolver,
    encoder: Arc<JwtEncoder>,
    decoder: Arc<JwtDecoder>,
    hasher: Arc<PasswordHasher>,
    validator: PasswordValidator,
    limiters: Arc<RateLimiters>,
    code_verifier: Arc<dyn CodeVerifier>,
    default_role: String,
    rotate_refresh_tokens: bool,
    deadline: Duration,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("default_role", &self.default_role)
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .field("code_verifier", &self.code_verifier)
            .finish()
    }
}

impl AuthService {
    /// Creates the service. Collaborators are injected; nothing is global.
    pub fn new(
        config: &AppConfig,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        sessions: Arc<SessionStore>,
        limiters: Arc<RateLimiters>,
        code_verifier: Arc<dyn CodeVerifier>,
    ) -> Self {
        let deadline = config.session.operation_timeout();
        Self {
            users,
            resolver: PermissionResolver::new(roles.clone(), deadline),
            roles,
            sessions,
            encoder: Arc::new(JwtEncoder::new(&config.auth)),
            decoder: Arc::new(JwtDecoder::new(&config.auth)),
            hasher: Arc::new(PasswordHasher::new(config.auth.hash_work_factor)),
            validator: PasswordValidator::new(&config.auth),
            limiters,
            code_verifier,
            default_role: config.auth.default_role.clone(),
            rotate_refresh_tokens: config.auth.rotate_refresh_tokens,
            deadline,
        }
    }

    /// The rate limiters, for administrative resets.
    pub fn limiters(&self) -> &RateLimiters {
        &self.limiters
    }

    /// Admits one request from `client_key` through the general limiter.
    pub async fn admit_request(&self, client_key: &str) -> AppResult<()> {
        self.limiters.general.check(client_key).await
    }

    /// Registers a principal holding exactly the default role.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<User> {
        let username = req.username.trim();
        if username.is_empty() {
            return Err(AppError::invalid_request("Username must not be empty"));
        }
        let email = non_empty(&req.email).map(str::to_string);
        let phone = non_empty(&req.phone).map(str::to_string);

        self.ensure_handle_free(
            self.users.get_by_username(username),
            "user.get_by_username",
            ErrorKind::UsernameTaken,
            "Username already exists",
        )
        .await?;
        if let Some(email) = &email {
            self.ensure_handle_free(
                self.users.get_by_email(email),
                "user.get_by_email",
                ErrorKind::EmailTaken,
                "Email already exists",
            )
            .await?;
        }
        if let Some(phone) = &phone {
            self.ensure_handle_free(
                self.users.get_by_phone(phone),
                "user.get_by_phone",
                ErrorKind::PhoneTaken,
                "Phone already exists",
            )
            .await?;
        }

        let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => {
                self.validator.validate(password)?;
                Some(self.hash(password.to_string()).await?)
            }
            None => None,
        };

        let role = self.default_role().await?;
        let user = with_deadline(
            self.deadline,
            "user.create",
            self.users.create(CreateUser {
                username: username.to_string(),
                email,
                phone,
                password_hash,
                status: UserStatus::Active,
                roles: vec![RoleGrant::system(role.id, role.name)],
            }),
        )
        .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticates by one of the four login modes and issues a token pair.
    pub async fn login(&self, req: LoginRequest) -> AppResult<TokenData> {
        let mode: LoginMode = req.login_type.parse()?;

        let user = match mode {
            LoginMode::Phone => {
                let (Some(phone), Some(code)) = (non_empty(&req.phone), non_empty(&req.code))
                else {
                    return Err(AppError::invalid_request("Phone and code are required"));
                };
                self.throttle_login(&req).await?;

                if !self.code_verifier.verify(phone, code).await? {
                    warn!(mode = %mode, "Login rejected: bad verification code");
                    return Err(AppError::invalid_credentials());
                }
                let lookup = self.users.get_by_phone(phone);
                self.lookup_principal(with_deadline(self.deadline, "user.get_by_phone", lookup))
                    .await?
            }
            LoginMode::Username | LoginMode::Email | LoginMode::Auto => {
                let identifier = match mode {
                    LoginMode::Username => non_empty(&req.username),
                    LoginMode::Email => non_empty(&req.email),
                    _ => non_empty(&req.username).or_else(|| non_empty(&req.email)),
                };
                let (Some(identifier), Some(password)) =
                    (identifier, req.password.as_deref().filter(|p| !p.is_empty()))
                else {
                    return Err(AppError::invalid_request(format!(
                        "Identifier and password are required for {mode} login"
                    )));
                };
                self.throttle_login(&req).await?;

                let user = match mode {
                    LoginMode::Username => {
                        let lookup = self.users.get_by_username(identifier);
                        with_deadline(self.deadline, "user.get_by_username", lookup).await
                    }
                    LoginMode::Email => {
                        let lookup = self.users.get_by_email(identifier);
                        with_deadline(self.deadline, "user.get_by_email", lookup).await
                    }
                    _ => {
                        let lookup = self.users.get_by_username_or_email(identifier);
                        with_deadline(self.deadline, "user.get_by_username_or_email", lookup)
                            .await
                    }
                };
                let user = self.lookup_principal(async { user }).await?;

                let Some(digest) = user.password_hash.clone() else {
                    warn!(user_id = %user.id, mode = %mode, "Login rejected: no password set");
                    return Err(AppError::invalid_credentials());
                };
                if !self.verify(password.to_string(), digest).await? {
                    warn!(user_id = %user.id, mode = %mode, "Login rejected: bad password");
                    return Err(AppError::invalid_credentials());
                }
                user
            }
        };

        Self::ensure_active(&user)?;

        let tokens = self.issue_tokens(&user, req.device.clone()).await?;

        let ip = non_empty(&req.device.ip_address);
        let recorded = with_deadline(
            self.deadline,
            "user.record_login",
            self.users.record_login(user.id, ip, Utc::now()),
        )
        .await;
        if let Err(e) = recorded {
            warn!(user_id = %user.id, error = %e, "Failed to record login history");
        }

        info!(user_id = %user.id, mode = %mode, "User logged in");
        Ok(tokens)
    }

    /// Exchanges a refresh token for a fresh pair with a recomputed
    /// permission snapshot.
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenData> {
        let claims = self.decoder.verify_refresh_token(refresh_token)?;
        let session = self.sessions.validate(claims.session_id()).await?;
        if session.user_id != claims.user_id() {
            warn!(session_id = %session.id, "Refresh rejected: session owner mismatch");
            return Err(AppError::session_invalid("Session does not belong to token subject"));
        }

        if self.rotate_refresh_tokens {
            if !self.sessions.consume(session.id).await? {
                warn!(session_id = %session.id, "Refresh rejected: session already consumed");
                return Err(AppError::session_invalid("Session has been revoked"));
            }
        } else {
            match self.sessions.touch(session.id).await {
                Ok(()) => {}
                Err(e) if e.kind == ErrorKind::SessionNotFound => {
                    return Err(AppError::session_invalid("Session not found"));
                }
                Err(e) => return Err(e),
            }
        }

        let user = with_deadline(
            self.deadline,
            "user.get_by_id",
            self.users.get_by_id(claims.user_id()),
        )
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::principal_not_found(format!("User {} no longer exists", claims.sub))
            } else {
                e
            }
        })?;
        Self::ensure_active(&user)?;

        let tokens = self.issue_tokens(&user, session.device()).await?;
        info!(user_id = %user.id, previous_session = %session.id, "Token refreshed");
        Ok(tokens)
    }

    /// Verifies an access token and optionally decides one access check.
    /// Stateless: sessions are not consulted.
    pub fn verify_token(&self, req: &VerifyTokenRequest) -> VerifyResult {
        let claims = match self.decoder.verify_access_token(&req.token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Token verification failed");
                return VerifyResult::invalid(e);
            }
        };

        let has_access = match (non_empty(&req.resource), non_empty(&req.action)) {
            (Some(resource), Some(action)) => Some(PermissionResolver::check_access(
                &claims.permissions,
                resource,
                action,
            )),
            _ => None,
        };

        VerifyResult {
            valid: true,
            user_id: Some(claims.sub),
            username: claims.username,
            roles: claims.roles,
            permissions: claims.permissions,
            has_access,
            error: None,
        }
    }

    /// Revokes every session of the token's principal, on all devices.
    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        let claims = self.decoder.verify_access_token(access_token)?;
        let revoked = self.sessions.revoke_all_for_principal(claims.user_id()).await?;
        info!(user_id = %claims.sub, revoked = revoked, "User logged out");
        Ok(())
    }

    /// Live sessions of the token's principal, newest first.
    pub async fn list_sessions(&self, access_token: &str) -> AppResult<Vec<Session>> {
        let claims = self.decoder.verify_access_token(access_token)?;
        self.sessions.list_active(claims.user_id()).await
    }

    /// Revokes one session by identifier.
    pub async fn revoke_session(&self, session_id: Uuid) -> AppResult<()> {
        self.sessions.revoke_one(session_id).await
    }

    async fn issue_tokens(&self, user: &User, device: DeviceInfo) -> AppResult<TokenData> {
        let now = Utc::now();
        let access = self.resolver.resolve_at(&user.roles, now).await;

        let (access_token, access_claims) = self.encoder.issue_access_token_at(
            user.id,
            user.display_name(),
            access.roles,
            access.permissions,
            now,
        )?;
        let (refresh_token, refresh_claims) = self.encoder.issue_refresh_token_at(user.id, now)?;

        self.sessions
            .create(CreateSession {
                id: refresh_claims.session_id(),
                user_id: user.id,
                device,
                expires_at: refresh_claims.expires_at(),
            })
            .await?;

        Ok(TokenData {
            access_token,
            refresh_token,
            expires_in: self.encoder.access_ttl_seconds(),
            token_type: "Bearer".to_string(),
            expires_at: access_claims.expires_at(),
            user_id: user.id,
        })
    }

    async fn throttle_login(&self, req: &LoginRequest) -> AppResult<()> {
        match req.client_identity() {
            Some(key) => self.limiters.login.check(key).await,
            None => Ok(()),
        }
    }

    async fn ensure_handle_free<F>(
        &self,
        lookup: F,
        operation: &str,
        taken: ErrorKind,
        message: &str,
    ) -> AppResult<()>
    where
        F: std::future::Future<Output = AppResult<User>>,
    {
        match with_deadline(self.deadline, operation, lookup).await {
            Ok(_) => Err(AppError::new(taken, message)),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn lookup_principal<F>(&self, lookup: F) -> AppResult<User>
    where
        F: std::future::Future<Output = AppResult<User>>,
    {
        match lookup.await {
            Ok(user) => Ok(user),
            Err(e) if e.is_not_found() => {
                warn!("Login rejected: unknown principal");
                Err(AppError::invalid_credentials())
            }
            Err(e) => Err(e),
        }
    }

    async fn default_role(&self) -> AppResult<authcenter_entity::role::Role> {
        let role = with_deadline(
            self.deadline,
            "role.get_by_name",
            self.roles.get_by_name(&self.default_role),
        )
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::role_lookup(format!("Default role '{}' not found", self.default_role))
            } else {
                e
            }
        })?;

        if !role.is_active() {
            return Err(AppError::role_lookup(format!(
                "Default role '{}' is not active",
                self.default_role
            )));
        }
        Ok(role)
    }

    fn ensure_active(user: &User) -> AppResult<()> {
        if user.can_login() {
            return Ok(());
        }
        warn!(user_id = %user.id, status = %user.status, "Login rejected: account not active");
        Err(AppError::account_disabled(format!(
            "Account is {}",
            user.status
        )))
    }

    async fn hash(&self, password: String) -> AppResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?
    }

    async fn verify(&self, password: String, digest: String) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &digest))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?
    }
}
