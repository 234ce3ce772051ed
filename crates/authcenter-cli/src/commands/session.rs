//! Session administration commands.

use clap::Args;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use authcenter_core::config::AppConfig;
use authcenter_core::error::AppError;

/// Arguments for the sessions command
#[derive(Debug, Args)]
pub struct SessionsArgs {
    /// Access token of the user whose sessions to list
    pub token: String,
}

/// Arguments for the revoke-session command
#[derive(Debug, Args)]
pub struct RevokeArgs {
    /// Session ID
    pub id: Uuid,
}

/// List live sessions, newest first
pub async fn list(
    args: &SessionsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = super::Context::connect(config).await?;
    let sessions = ctx.service.list_sessions(&args.token).await?;
    ctx.db.close().await;

    output::sessions(&sessions, format);
    Ok(())
}

/// Revoke a single session
pub async fn revoke(args: &RevokeArgs, config: &AppConfig) -> Result<(), AppError> {
    let ctx = super::Context::connect(config).await?;
    ctx.service.revoke_session(args.id).await?;
    ctx.db.close().await;

    output::success(&format!("Session {} revoked", args.id));
    Ok(())
}

/// Run one cleanup pass
pub async fn cleanup(config: &AppConfig) -> Result<(), AppError> {
    let ctx = super::Context::connect(config).await?;
    let deleted = ctx.sessions.cleanup().await?;
    ctx.db.close().await;

    if deleted == 0 {
        output::warning("No revoked or expired sessions found");
    } else {
        output::success(&format!("Deleted {deleted} sessions"));
    }
    Ok(())
}
