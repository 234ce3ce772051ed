//! Database migration command.

use crate::output;
use authcenter_core::config::AppConfig;
use authcenter_core::error::AppError;
use authcenter_database::DatabasePool;

/// Apply all pending migrations and report the resulting schema version
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;

    let before = db.schema_state().await?;
    if before.dirty {
        output::warning("A previous migration did not finish; the migrator will refuse to continue");
    }
    authcenter_database::migration::run_migrations(db.pool()).await?;
    let after = db.schema_state().await?;
    db.close().await;

    if after.applied == before.applied {
        output::success("Nothing to apply");
    }
    output::schema(&after);
    Ok(())
}
