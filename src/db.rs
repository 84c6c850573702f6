use crate::config::AppConfig;
use crate::errors::ServiceError;
use futures::future::BoxFuture;
use metrics::{counter, gauge, histogram};
use migrations::{Migrator, CONSTRAINT_VIOLATION_PREFIX};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbBackend,
    DbErr, QuerySelect, TransactionError, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool to the database with custom configuration
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("stockroom_db.max_connections", config.max_connections as f64);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::db_error(e)
    })?;

    info!(
        backend = ?db_pool.get_database_backend(),
        "Database connection pool established successfully"
    );

    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Runs every pending migration
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = Migrator::up(pool, None).await.map_err(migration_error);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!(
            "Database migrations completed successfully in {:?}",
            elapsed
        ),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Reverts the last `steps` applied migrations, or all of them when `None`.
pub async fn rollback_migrations(pool: &DbPool, steps: Option<u32>) -> Result<(), ServiceError> {
    warn!(?steps, "Rolling back database migrations");
    Migrator::down(pool, steps).await.map_err(migration_error)
}

fn migration_error(err: DbErr) -> ServiceError {
    match err {
        DbErr::Migration(message) if message.starts_with(CONSTRAINT_VIOLATION_PREFIX) => {
            ServiceError::ConstraintViolation(message)
        }
        DbErr::Migration(message) => ServiceError::MigrationError(message),
        other => ServiceError::db_error(other),
    }
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    debug!("Checking database connection");
    let start = std::time::Instant::now();

    let result = pool.ping().await.map_err(ServiceError::db_error);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            debug!("Database connection check successful in {:?}", elapsed);
            gauge!(
                "stockroom_db.connection_latency",
                elapsed.as_millis() as f64
            );
        }
        Err(e) => {
            error!(
                "Database connection check failed after {:?}: {}",
                elapsed, e
            );
            counter!("stockroom_db.connection_failures", 1);
        }
    }

    result
}

/// Runs `f` inside one database transaction, committing on `Ok` and
/// rolling back on `Err`.
pub async fn with_transaction<F, T>(db: &DbPool, f: F) -> Result<T, ServiceError>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<T, ServiceError>> + Send,
    T: Send,
{
    let transaction_id = Uuid::new_v4();
    let start = std::time::Instant::now();

    debug!(transaction_id = %transaction_id, "Starting database transaction");
    counter!("stockroom_db.transaction.started", 1);

    let result = db.transaction::<_, T, ServiceError>(f).await;

    let elapsed = start.elapsed();
    histogram!("stockroom_db.transaction.duration", elapsed);

    match &result {
        Ok(_) => {
            counter!("stockroom_db.transaction.committed", 1);
            debug!(transaction_id = %transaction_id, "Transaction committed in {:?}", elapsed);
        }
        Err(_) => {
            counter!("stockroom_db.transaction.rolled_back", 1);
            warn!(transaction_id = %transaction_id, "Transaction rolled back after {:?}", elapsed);
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(e) => ServiceError::db_error(e),
        TransactionError::Transaction(e) => e,
    })
}

/// Whether the backend understands `SELECT ... FOR UPDATE`.
///
/// SQLite serializes writers on the whole database and rejects the clause.
pub fn supports_row_locks(backend: DbBackend) -> bool {
    matches!(backend, DbBackend::Postgres | DbBackend::MySql)
}

/// Adds a row lock to `query` when the backend supports one.
pub fn lock_for_update<Q: QuerySelect>(query: Q, backend: DbBackend) -> Q {
    if supports_row_locks(backend) {
        query.lock_exclusive()
    } else {
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{EntityTrait, QueryTrait};

    #[test]
    fn row_locks_skipped_on_sqlite() {
        assert!(supports_row_locks(DbBackend::Postgres));
        assert!(supports_row_locks(DbBackend::MySql));
        assert!(!supports_row_locks(DbBackend::Sqlite));
    }

    #[test]
    fn lock_clause_only_rendered_for_postgres() {
        let pg = lock_for_update(
            crate::entities::inventory_record::Entity::find(),
            DbBackend::Postgres,
        )
        .build(DbBackend::Postgres)
        .to_string();
        assert!(pg.ends_with("FOR UPDATE"));

        let lite = lock_for_update(
            crate::entities::inventory_record::Entity::find(),
            DbBackend::Sqlite,
        )
        .build(DbBackend::Sqlite)
        .to_string();
        assert!(!lite.contains("FOR UPDATE"));
    }

    #[test]
    fn duplicate_rows_on_rollback_map_to_constraint_violation() {
        let err = migration_error(DbErr::Migration(format!(
            "{}: 1 movement detail(s) referenced twice",
            CONSTRAINT_VIOLATION_PREFIX
        )));
        assert!(matches!(err, ServiceError::ConstraintViolation(_)));

        let err = migration_error(DbErr::Migration("boom".into()));
        assert!(matches!(err, ServiceError::MigrationError(_)));
    }

    #[tokio::test]
    async fn sqlite_memory_connection_pings() {
        let db = establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        })
        .await
        .unwrap();
        assert!(check_connection(&db).await.is_ok());
    }
}
