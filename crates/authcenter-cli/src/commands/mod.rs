//! CLI command definitions and dispatch.

pub mod account;
pub mod migrate;
pub mod session;
pub mod token;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use authcenter_auth::{AuthService, DisabledCodeVerifier, RateLimiters, SessionStore};
use authcenter_core::config::AppConfig;
use authcenter_core::error::AppError;
use authcenter_database::DatabasePool;
use authcenter_database::repositories::{PgRoleRepository, PgSessionRepository, PgUserRepository};

/// AuthCenter: credential issuance and session administration
#[derive(Debug, Parser)]
#[command(name = "authcenter", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (selects `config/<env>.toml`)
    #[arg(short, long, env = "AUTHCENTER_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Register a new user
    Register(account::RegisterArgs),
    /// Log in and print a token pair
    Login(token::LoginArgs),
    /// Exchange a refresh token for a new pair
    Refresh(token::RefreshArgs),
    /// Verify an access token, optionally checking one permission
    Verify(token::VerifyArgs),
    /// Revoke every session of the token's user
    Logout(token::LogoutArgs),
    /// List live sessions of the token's user
    Sessions(session::SessionsArgs),
    /// Revoke one session by ID
    RevokeSession(session::RevokeArgs),
    /// Delete revoked and expired sessions
    Cleanup,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.env)?;

        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::Register(args) => account::execute(args, &config, self.format).await,
            Commands::Login(args) => token::login(args, &config, self.format).await,
            Commands::Refresh(args) => token::refresh(args, &config, self.format).await,
            Commands::Verify(args) => token::verify(args, &config, self.format).await,
            Commands::Logout(args) => token::logout(args, &config).await,
            Commands::Sessions(args) => session::list(args, &config, self.format).await,
            Commands::RevokeSession(args) => session::revoke(args, &config).await,
            Commands::Cleanup => session::cleanup(&config).await,
        }
    }
}

/// Database-backed auth components for one command run.
pub struct Context {
    pub db: DatabasePool,
    pub service: AuthService,
    pub sessions: Arc<SessionStore>,
}

impl Context {
    /// Connect and wire the auth service over the PostgreSQL adapters.
    ///
    /// Phone login needs an SMS provider, so codes are always rejected here.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let db = DatabasePool::connect(&config.database).await?;
        let pool = db.pool().clone();

        let sessions = Arc::new(SessionStore::new(
            Arc::new(PgSessionRepository::new(pool.clone())),
            &config.session,
        ));
        let service = AuthService::new(
            config,
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgRoleRepository::new(pool)),
            Arc::clone(&sessions),
            Arc::new(RateLimiters::new(&config.rate_limit)),
            Arc::new(DisabledCodeVerifier),
        );

        Ok(Self {
            db,
            service,
            sessions,
        })
    }
}

/// Prompt for a password without echo.
pub fn prompt_password(prompt: &str, confirm: bool) -> Result<String, AppError> {
    let mut input = dialoguer::Password::new().with_prompt(prompt);
    if confirm {
        input = input.with_confirmation("Repeat password", "Passwords do not match");
    }
    input
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}
