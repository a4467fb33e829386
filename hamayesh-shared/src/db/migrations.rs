/// Schema bootstrap
///
/// The schema in `migrations/` is embedded at compile time. With
/// `DATABASE_RUN_MIGRATIONS=true` the API server creates the database and
/// applies pending migrations on start; otherwise it only reports which
/// versions are missing.
///
/// # Example
///
/// ```no_run
/// use hamayesh_shared::db::pool::{create_pool, DatabaseConfig};
/// use hamayesh_shared::db::migrations::{ensure_database_exists, migration_status, run_migrations};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let url = std::env::var("DATABASE_URL")?;
///     ensure_database_exists(&url).await?;
///
///     let pool = create_pool(DatabaseConfig { url, ..Default::default() }).await?;
///     run_migrations(&pool).await?;
///     assert!(migration_status(&pool).await?.is_up_to_date());
///     Ok(())
/// }
/// ```

use sqlx::{
    migrate::{MigrateDatabase, Migrator},
    postgres::PgPool,
    Postgres,
};
use tracing::{info, warn};

static SCHEMA: Migrator = sqlx::migrate!("../migrations");

/// Applied and missing schema versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Versions recorded as successfully applied
    pub applied: Vec<i64>,

    /// Embedded versions not applied yet, oldest first
    pub pending: Vec<i64>,
}

impl MigrationStatus {
    fn new(embedded: impl IntoIterator<Item = i64>, mut applied: Vec<i64>) -> Self {
        applied.sort_unstable();
        let mut pending: Vec<i64> = embedded
            .into_iter()
            .filter(|v| applied.binary_search(v).is_err())
            .collect();
        pending.sort_unstable();

        Self { applied, pending }
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Applies every pending migration, each in its own transaction
///
/// # Errors
///
/// Fails if a migration errors or an applied one was edited afterwards.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    SCHEMA.run(pool).await.map_err(|e| {
        warn!(error = %e, "Schema migration failed");
        e
    })?;

    info!(versions = SCHEMA.iter().count(), "Schema up to date");
    Ok(())
}

/// Compares the embedded migrations with the `_sqlx_migrations` ledger
pub async fn migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let has_ledger: bool = sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await?;

    let applied: Vec<i64> = if has_ledger {
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await?
    } else {
        Vec::new()
    };

    Ok(MigrationStatus::new(SCHEMA.iter().map(|m| m.version), applied))
}

/// Creates the database named in `database_url` when it is missing
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        Postgres::create_database(database_url).await?;
        info!("Created empty hamayesh database");
    }
    Ok(())
}
