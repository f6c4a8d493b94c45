//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling, migration support, connection pragmas, and
//! the [`Database::atomic`] helper every ledger-affecting unit of work runs
//! through.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Type alias for a connection checked out of the pool.
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Milliseconds a writer waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Apply the pragmas every connection needs.
///
/// # Errors
/// Returns an error if a pragma fails to apply.
pub fn configure_sqlite_connection(conn: &mut SqliteConnection) -> diesel::QueryResult<()> {
    conn.batch_execute(&format!(
        "PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}; PRAGMA foreign_keys = ON;"
    ))
}

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        configure_sqlite_connection(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create a connection pool for the given database URL.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Run all pending database migrations.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Connection(e.to_string()))?;
    Ok(())
}

/// Migrated SQLite database shared by the engine's services.
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (creating if needed) and migrate the database at `url`.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built or migrations fail.
    pub fn open(url: &str, pool_size: u32) -> Result<Self> {
        let pool = create_pool(url, pool_size)?;
        run_migrations(&pool)?;
        debug!(url, pool_size, "Database ready");
        Ok(Self { pool })
    }

    /// Private in-memory database.
    ///
    /// Every SQLite `:memory:` connection is a separate database, so the
    /// pool holds exactly one connection. Callers must not hold a
    /// connection while acquiring another.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built or migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:", 1)
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// Returns [`Error::Connection`] if no connection becomes available.
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    /// Run `f` inside an immediate transaction.
    ///
    /// The write lock is taken when the transaction begins, so concurrent
    /// units of work serialize instead of interleaving. Any error rolls the
    /// whole unit back.
    ///
    /// # Errors
    /// Returns whatever `f` returns, or a database error if the transaction
    /// cannot begin or commit.
    pub fn atomic<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.connection()?;
        conn.immediate_transaction(f)
    }

    /// Underlying pool.
    #[must_use]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::prelude::*;

    #[derive(diesel::QueryableByName)]
    struct TableName {
        #[diesel(sql_type = diesel::sql_types::Text)]
        name: String,
    }

    #[derive(diesel::QueryableByName)]
    struct Count {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        value: i64,
    }

    #[derive(diesel::QueryableByName)]
    struct ForeignKeys {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        foreign_keys: i64,
    }

    #[derive(diesel::QueryableByName)]
    struct BusyTimeout {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        timeout: i64,
    }

    #[test]
    fn open_in_memory_creates_tables() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.connection().unwrap();

        let tables: Vec<String> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
        )
        .load::<TableName>(&mut conn)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

        for expected in [
            "ads",
            "audit_logs",
            "balances",
            "campaigns",
            "channels",
            "escrow_creators",
            "escrows",
            "match_logs",
            "performance_records",
            "placements",
            "reputations",
            "transactions",
            "withdrawals",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn pragmas_applied_on_acquire() {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.connection().unwrap();

        let fk: Vec<ForeignKeys> = diesel::sql_query("PRAGMA foreign_keys")
            .load(&mut conn)
            .unwrap();
        assert_eq!(fk[0].foreign_keys, 1);

        let busy: Vec<BusyTimeout> = diesel::sql_query("PRAGMA busy_timeout")
            .load(&mut conn)
            .unwrap();
        assert_eq!(busy[0].timeout, i64::from(BUSY_TIMEOUT_MS));
    }

    #[test]
    fn migrations_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        run_migrations(db.pool()).unwrap();
        run_migrations(db.pool()).unwrap();
    }

    #[test]
    fn atomic_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.atomic(|conn| {
            diesel::sql_query(
                "INSERT INTO audit_logs (actor, action, target_type, target_id, description, created_at) \
                 VALUES ('a', 'b', 'c', 'd', 'e', 'f')",
            )
            .execute(conn)?;
            Err(Error::Parse("abort".into()))
        });
        assert!(result.is_err());

        let mut conn = db.connection().unwrap();
        let rows: Vec<Count> = diesel::sql_query("SELECT COUNT(*) AS value FROM audit_logs")
            .load(&mut conn)
            .unwrap();
        assert_eq!(rows[0].value, 0);
    }
}
