//! AuthCenter CLI entry point.
//!
//! Exit status: `0` success, `1` any other failure, `2` the request was
//! rejected (bad input, credentials, tokens, sessions), `3` a retryable
//! infrastructure failure.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use authcenter_core::error::{AppError, ErrorKind};

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::from(exit_status(&e))
        }
    }
}

fn exit_status(err: &AppError) -> u8 {
    if err.is_retryable() {
        return 3;
    }
    match err.kind {
        ErrorKind::InvalidRequest
        | ErrorKind::InvalidCredentials
        | ErrorKind::AccountDisabled
        | ErrorKind::TokenInvalid
        | ErrorKind::TokenExpired
        | ErrorKind::SessionInvalid
        | ErrorKind::SessionNotFound
        | ErrorKind::PrincipalNotFound
        | ErrorKind::RateLimited
        | ErrorKind::UsernameTaken
        | ErrorKind::EmailTaken
        | ErrorKind::PhoneTaken => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_by_kind() {
        assert_eq!(exit_status(&AppError::invalid_credentials()), 2);
        assert_eq!(exit_status(&AppError::session_invalid("gone")), 2);
        assert_eq!(exit_status(&AppError::timeout("slow")), 3);
        assert_eq!(exit_status(&AppError::persistence("down")), 3);
        assert_eq!(exit_status(&AppError::configuration("bad")), 1);
    }
}
