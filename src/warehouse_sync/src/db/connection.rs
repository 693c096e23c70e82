//! Pooled warehouse connections.
//!
//! A connection is checked out per logical operation (one probe, one insert)
//! and handed back immediately. SQLite connections get the same PRAGMAs on
//! every checkout-time open: WAL journaling, foreign_keys=ON and a 5000ms
//! busy_timeout.

use std::time::Duration;

use diesel::{
    Connection, PgConnection, RunQueryDsl, SqliteConnection,
    backend::Backend,
    connection::SimpleConnection,
    deserialize::QueryableByName,
    query_builder::{BoxedSqlQuery, SqlQuery},
    r2d2::{ConnectionManager, CustomizeConnection, Pool},
    serialize::ToSql,
    sql_query,
    sql_types::{BigInt, Bool, Double, HasSqlType, Nullable, Text},
};

use crate::{
    db::statement::{Dialect, SqlValue, Statement},
    error::StorageError,
};

/// PostgreSQL pool.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;
/// SQLite pool.
pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Pool sizing and liveness settings.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    /// Connections kept open while idle.
    pub min_idle: u32,
    /// Hard ceiling (idle + overflow).
    pub max_size: u32,
    /// Connections older than this are recycled.
    pub max_lifetime: Duration,
    /// Ping each connection before handing it out.
    pub test_on_checkout: bool,
    /// How long a checkout waits for a free connection.
    pub connection_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min_idle: 5,
            max_size: 15,
            max_lifetime: Duration::from_secs(3600),
            test_on_checkout: true,
            connection_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        // busy_timeout first so the WAL switch waits out sibling connections
        conn.batch_execute(
            "PRAGMA busy_timeout=5000; PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Key rows loadable from either backend.
pub trait StoredKey:
    QueryableByName<diesel::pg::Pg> + QueryableByName<diesel::sqlite::Sqlite> + 'static
{
}

impl<T> StoredKey for T where
    T: QueryableByName<diesel::pg::Pg> + QueryableByName<diesel::sqlite::Sqlite> + 'static
{
}

/// Runs `$body` with `$conn` bound to a checked-out connection and `$db`
/// naming its backend type.
macro_rules! with_conn {
    ($pool:expr, |$conn:ident, $db:ident| $body:expr) => {
        match $pool {
            $crate::db::connection::WarehousePool::Postgres(pool) => {
                #[allow(unused)]
                type $db = diesel::pg::Pg;
                let mut pooled = pool.get()?;
                let $conn: &mut diesel::PgConnection = &mut pooled;
                $body
            }
            $crate::db::connection::WarehousePool::Sqlite(pool) => {
                #[allow(unused)]
                type $db = diesel::sqlite::Sqlite;
                let mut pooled = pool.get()?;
                let $conn: &mut diesel::SqliteConnection = &mut pooled;
                $body
            }
        }
    };
}
pub(crate) use with_conn;

/// Handle to the warehouse.
#[derive(Clone)]
pub enum WarehousePool {
    /// PostgreSQL backend.
    Postgres(PgPool),
    /// SQLite backend (local runs, tests).
    Sqlite(SqlitePool),
}

impl std::fmt::Debug for WarehousePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WarehousePool").field(&self.dialect()).finish()
    }
}

impl WarehousePool {
    /// Opens a pool for `database_url`.
    ///
    /// Accepts URLs that start with "postgres://" or "postgresql://" for
    /// PostgreSQL; "sqlite:" URLs and bare file paths select SQLite.
    pub fn connect(database_url: &str, settings: PoolSettings) -> Result<Self, StorageError> {
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            let manager = ConnectionManager::<PgConnection>::new(database_url);
            let pool = Pool::builder()
                .min_idle(Some(settings.min_idle))
                .max_size(settings.max_size)
                .max_lifetime(Some(settings.max_lifetime))
                .test_on_check_out(settings.test_on_checkout)
                .connection_timeout(settings.connection_timeout)
                .build(manager)?;
            return Ok(WarehousePool::Postgres(pool));
        }
        if database_url.contains("://") && !database_url.starts_with("sqlite://") {
            return Err(StorageError::UnsupportedUrl(database_url.to_string()));
        }

        let manager = ConnectionManager::<SqliteConnection>::new(sqlite_path(database_url));
        let pool = Pool::builder()
            .min_idle(Some(settings.min_idle))
            .max_size(settings.max_size)
            .max_lifetime(Some(settings.max_lifetime))
            .test_on_check_out(settings.test_on_checkout)
            .connection_timeout(settings.connection_timeout)
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)?;
        Ok(WarehousePool::Sqlite(pool))
    }

    /// Placeholder dialect of the backend.
    pub fn dialect(&self) -> Dialect {
        match self {
            WarehousePool::Postgres(_) => Dialect::Postgres,
            WarehousePool::Sqlite(_) => Dialect::Sqlite,
        }
    }

    /// Runs a read-only statement and decodes every row as `K`.
    pub fn load_keys<K: StoredKey>(&self, stmt: &Statement) -> Result<Vec<K>, StorageError> {
        with_conn!(self, |conn, Db| {
            let query = bind_params(sql_query(stmt.sql.as_str()).into_boxed::<Db>(), &stmt.params);
            Ok(query.load::<K>(conn)?)
        })
    }

    /// Executes one statement inside its own transaction. Commits on success,
    /// rolls back and propagates on failure.
    pub fn execute_atomic(&self, stmt: &Statement) -> Result<usize, StorageError> {
        with_conn!(self, |conn, Db| {
            let affected = conn.transaction::<_, diesel::result::Error, _>(|conn| {
                bind_params(sql_query(stmt.sql.as_str()).into_boxed::<Db>(), &stmt.params)
                    .execute(conn)
            })?;
            Ok(affected)
        })
    }

    /// Runs semicolon separated SQL without binds.
    pub fn batch_execute(&self, sql: &str) -> Result<(), StorageError> {
        with_conn!(self, |conn, Db| Ok(conn.batch_execute(sql)?))
    }
}

fn sqlite_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

fn bind_params<'f, DB>(
    mut query: BoxedSqlQuery<'f, DB, SqlQuery>,
    params: &[SqlValue],
) -> BoxedSqlQuery<'f, DB, SqlQuery>
where
    DB: Backend + HasSqlType<Text> + HasSqlType<BigInt> + HasSqlType<Bool> + HasSqlType<Double>,
    String: ToSql<Text, DB>,
    i64: ToSql<BigInt, DB>,
    bool: ToSql<Bool, DB>,
    f64: ToSql<Double, DB>,
{
    for param in params {
        query = match param {
            SqlValue::Text(v) => query.bind::<Text, _>(v.clone()),
            SqlValue::BigInt(v) => query.bind::<BigInt, _>(*v),
            SqlValue::NullableBigInt(v) => query.bind::<Nullable<BigInt>, _>(*v),
            SqlValue::Bool(v) => query.bind::<Bool, _>(*v),
            SqlValue::Double(v) => query.bind::<Double, _>(*v),
        };
    }
    query
}
