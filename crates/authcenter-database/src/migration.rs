//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use authcenter_core::error::{AppError, ErrorKind};

/// Run all pending migrations, including the stock role seed.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    let migrator = sqlx::migrate!("../../migrations");
    info!(known = migrator.iter().count(), "Applying pending migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    const INIT_SCHEMA: &str = include_str!("../../../migrations/0001_init.sql");

    fn table_body(name: &str) -> &'static str {
        let start = INIT_SCHEMA
            .find(&format!("CREATE TABLE {name} ("))
            .unwrap_or_else(|| panic!("table {name} missing"));
        let rest = &INIT_SCHEMA[start..];
        &rest[..rest.find("\n);").unwrap()]
    }

    #[test]
    fn test_sessions_survive_principal_deletion() {
        let sessions = table_body("sessions");
        assert!(sessions.contains("user_id"));
        assert!(!sessions.contains("ON DELETE CASCADE"));
        assert!(!sessions.contains("REFERENCES users"));
    }

    #[test]
    fn test_grants_follow_principal_deletion() {
        assert!(table_body("user_roles").contains("REFERENCES users (id) ON DELETE CASCADE"));
    }
}
