/// Database migration runner
///
/// Migrations live in `devlabs-shared/migrations/` and are embedded into the
/// binary at compile time by `sqlx::migrate!`. Each migration is a pair of
/// files:
/// - `{timestamp}_{name}.up.sql` - the "up" migration
/// - `{timestamp}_{name}.down.sql` - the rollback

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Runs all pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations complete");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Creates the database named in `database_url` if it doesn't exist
///
/// Meant for development setups; production databases are provisioned ahead
/// of time.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
    } else {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}
