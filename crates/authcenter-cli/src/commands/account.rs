//! User registration command.

use clap::Args;

use crate::output::{self, OutputFormat};
use authcenter_auth::service::RegisterRequest;
use authcenter_core::config::AppConfig;
use authcenter_core::error::AppError;

/// Arguments for the register command
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Username
    pub username: String,
    /// Email address
    #[arg(long)]
    pub email: Option<String>,
    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,
    /// Password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,
    /// Register without a password (phone-code login only)
    #[arg(long, conflicts_with = "password")]
    pub no_password: bool,
}

/// Register a user with the default role
pub async fn execute(
    args: &RegisterArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let password = match (&args.password, args.no_password) {
        (Some(p), _) => Some(p.clone()),
        (None, true) => None,
        (None, false) => Some(super::prompt_password("Password", true)?),
    };

    let ctx = super::Context::connect(config).await?;
    let user = ctx
        .service
        .register(RegisterRequest {
            username: args.username.clone(),
            email: args.email.clone(),
            phone: args.phone.clone(),
            password,
        })
        .await?;
    ctx.db.close().await;

    output::user(&user, format);
    Ok(())
}
