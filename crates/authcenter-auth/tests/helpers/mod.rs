//! Shared fixtures for the auth integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use authcenter_auth::service::{LoginRequest, RegisterRequest, TokenData};
use authcenter_auth::{AuthService, MemoryCodeVerifier, RateLimiters, SessionStore};
use authcenter_core::config::AppConfig;
use authcenter_database::memory::{
    MemoryRoleRepository, MemorySessionRepository, MemoryUserRepository,
};
use authcenter_database::repositories::UserRepository;
use authcenter_entity::user::User;

pub const PASSWORD: &str = "s3cret123";

/// Service wired to in-memory collaborators, with handles kept for
/// direct inspection.
pub struct TestApp {
    pub service: AuthService,
    pub config: AppConfig,
    pub users: Arc<MemoryUserRepository>,
    pub roles: Arc<MemoryRoleRepository>,
    pub sessions: Arc<MemorySessionRepository>,
    pub codes: Arc<MemoryCodeVerifier>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(test_config(), MemoryRoleRepository::with_stock_roles())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, MemoryRoleRepository::with_stock_roles())
    }

    pub fn build(config: AppConfig, roles: MemoryRoleRepository) -> Self {
        let users = Arc::new(MemoryUserRepository::new());
        let roles = Arc::new(roles);
        let sessions = Arc::new(MemorySessionRepository::new());
        let codes = Arc::new(MemoryCodeVerifier::new());

        let store = Arc::new(SessionStore::new(sessions.clone(), &config.session));
        let limiters = Arc::new(RateLimiters::new(&config.rate_limit));
        let service = AuthService::new(
            &config,
            users.clone(),
            roles.clone(),
            store,
            limiters,
            codes.clone(),
        );

        Self {
            service,
            config,
            users,
            roles,
            sessions,
            codes,
        }
    }

    /// Register `username` with the shared test password.
    pub async fn register(&self, username: &str) -> User {
        self.service
            .register(RegisterRequest {
                username: username.to_string(),
                email: Some(format!("{username}@example.com")),
                password: Some(PASSWORD.to_string()),
                ..RegisterRequest::default()
            })
            .await
            .expect("registration failed")
    }

    /// Log in by username with the shared test password.
    pub async fn login(&self, username: &str) -> TokenData {
        self.service
            .login(username_login(username, PASSWORD))
            .await
            .expect("login failed")
    }

    pub async fn reload(&self, user: &User) -> User {
        self.users.get_by_id(user.id).await.expect("user vanished")
    }
}

pub fn username_login(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        login_type: "username".to_string(),
        username: Some(username.to_string()),
        password: Some(password.to_string()),
        ..LoginRequest::default()
    }
}
