//! PostgreSQL pool setup and schema state.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use authcenter_core::config::DatabaseConfig;
use authcenter_core::error::{AppError, ErrorKind};
use authcenter_core::result::AppResult;

/// Shared handle to the PostgreSQL pool, passed explicitly to every adapter.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

/// Migration bookkeeping as recorded in `_sqlx_migrations`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaState {
    /// Successfully applied migrations.
    pub applied: i64,
    /// Highest successfully applied version, if any.
    pub latest_version: Option<i64>,
    /// A migration started but did not finish.
    pub dirty: bool,
}

impl DatabasePool {
    /// Open a pool sized and timed from configuration.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = connect_options(&config.url)?;
        info!(
            target_db = %describe(&options),
            max_connections = config.max_connections,
            "Opening PostgreSQL pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to open database pool", e)
            })?;

        Ok(Self { pool })
    }

    /// Borrow the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Reads the applied migration state. A database the migrator has never
    /// touched reports the empty state.
    pub async fn schema_state(&self) -> AppResult<SchemaState> {
        let tracked: bool =
            sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(schema_error)?;
        if !tracked {
            return Ok(SchemaState::default());
        }

        let (applied, latest_version, dirty): (i64, Option<i64>, bool) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE success), \
                    MAX(version) FILTER (WHERE success), \
                    COALESCE(BOOL_OR(NOT success), FALSE) \
             FROM _sqlx_migrations",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(schema_error)?;

        Ok(SchemaState {
            applied,
            latest_version,
            dirty,
        })
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

fn connect_options(url: &str) -> AppResult<PgConnectOptions> {
    PgConnectOptions::from_str(url).map_err(|e| {
        AppError::with_source(ErrorKind::Configuration, "database.url is not a PostgreSQL URL", e)
    })
}

/// `user@host:port/database`, never the password.
fn describe(options: &PgConnectOptions) -> String {
    format!(
        "{}@{}:{}/{}",
        options.get_username(),
        options.get_host(),
        options.get_port(),
        options.get_database().unwrap_or("-")
    )
}

fn schema_error(e: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Persistence, "Failed to read migration state", e)
}
