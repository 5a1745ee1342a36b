/// Database migration runner
///
/// Wraps sqlx's embedded migration system. Migration files live in the
/// `migrations/` directory at the crate root as `{timestamp}_{name}.sql`
/// and are compiled into the binary, so deployments never depend on the
/// source tree being present.
///
/// # Example
///
/// ```no_run
/// use tackboard_shared::db::migrations::{get_migration_status, run_migrations};
/// use tackboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     })
///     .await?;
///
///     run_migrations(&pool).await?;
///
///     let status = get_migration_status(&pool).await?;
///     println!("Applied {} migrations", status.applied_migrations);
///
///     Ok(())
/// }
/// ```

use sqlx::postgres::PgPool;
use tracing::{debug, info, warn};

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,
}

/// Runs all pending database migrations
///
/// Migrations that have already been applied are skipped; a failing
/// migration is rolled back and returned as an error, leaving the
/// schema at its previous version.
///
/// # Example
///
/// ```no_run
/// use tackboard_shared::db::migrations::run_migrations;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("./migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Gets the current migration status
///
/// Reports how many migrations have been applied and the latest version,
/// based on sqlx's `_sqlx_migrations` bookkeeping table.
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT
            COUNT(*) as count,
            MAX(version) as latest_version
         FROM _sqlx_migrations
         WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_status_clone() {
        let status = MigrationStatus {
            applied_migrations: 1,
            latest_version: Some(20260705093000),
        };

        let cloned = status.clone();
        assert_eq!(status.applied_migrations, cloned.applied_migrations);
        assert_eq!(status.latest_version, cloned.latest_version);
    }

    // Runner tests require a running database and live in tests/
}
