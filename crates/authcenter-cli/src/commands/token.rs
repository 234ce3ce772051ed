//! Token commands: login, refresh, verify, logout.

use clap::Args;

use crate::output::{self, OutputFormat};
use authcenter_auth::service::{LoginMode, LoginRequest, VerifyTokenRequest};
use authcenter_core::config::AppConfig;
use authcenter_core::error::AppError;

/// Arguments for the login command
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Login mode: username, email, phone or auto
    #[arg(short = 't', long = "type", default_value = "email")]
    pub login_type: String,
    /// Username (or email in auto mode)
    #[arg(short, long)]
    pub username: Option<String>,
    /// Email address
    #[arg(long)]
    pub email: Option<String>,
    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,
    /// Password (prompted when omitted in password modes)
    #[arg(long)]
    pub password: Option<String>,
    /// One-time code for phone login
    #[arg(long)]
    pub code: Option<String>,
}

/// Arguments for the refresh command
#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Refresh token
    pub token: String,
}

/// Arguments for the verify command
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Access token
    pub token: String,
    /// Resource to check
    #[arg(long, requires = "action")]
    pub resource: Option<String>,
    /// Action to check
    #[arg(long, requires = "resource")]
    pub action: Option<String>,
}

/// Arguments for the logout command
#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Access token
    pub token: String,
    /// Skip confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Log in and print the issued pair
pub async fn login(args: &LoginArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let mode: LoginMode = args.login_type.parse()?;
    let password = match (&args.password, mode) {
        (Some(p), _) => Some(p.clone()),
        (None, LoginMode::Phone) => None,
        (None, _) => Some(super::prompt_password("Password", false)?),
    };

    let ctx = super::Context::connect(config).await?;
    let tokens = ctx
        .service
        .login(LoginRequest {
            login_type: args.login_type.clone(),
            username: args.username.clone(),
            email: args.email.clone(),
            phone: args.phone.clone(),
            password,
            code: args.code.clone(),
            ..LoginRequest::default()
        })
        .await?;
    ctx.db.close().await;

    output::tokens(&tokens, format);
    Ok(())
}

/// Exchange a refresh token
pub async fn refresh(
    args: &RefreshArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = super::Context::connect(config).await?;
    let tokens = ctx.service.refresh_token(&args.token).await?;
    ctx.db.close().await;

    output::tokens(&tokens, format);
    Ok(())
}

/// Verify an access token without touching sessions
pub async fn verify(
    args: &VerifyArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = super::Context::connect(config).await?;
    let result = ctx
        .service
        .verify_token(&VerifyTokenRequest {
            token: args.token.clone(),
            resource: args.resource.clone(),
            action: args.action.clone(),
        })
        .into_result()?;
    ctx.db.close().await;

    output::verification(&result, format);
    Ok(())
}

/// Revoke every session of the token's user
pub async fn logout(args: &LogoutArgs, config: &AppConfig) -> Result<(), AppError> {
    if !args.force {
        let confirm = dialoguer::Confirm::new()
            .with_prompt("This signs the user out on every device. Continue?")
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let ctx = super::Context::connect(config).await?;
    ctx.service.logout(&args.token).await?;
    ctx.db.close().await;

    output::success("Logged out on all devices");
    Ok(())
}
