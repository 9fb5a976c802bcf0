//! SQLite connection, schema setup, and seeding.

use rusqlite::{params, Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AppError;

/// Bootstrap identity seeded on first run.
pub const DEFAULT_USER_NAME: &str = "fisherman";
pub const DEFAULT_USER_EMAIL: &str = "fisherman@creel.app";

#[derive(Debug)]
pub struct DbPool(pub Mutex<Connection>);

/// Default on-disk location: `<platform data dir>/creel/creel.db`.
pub fn default_db_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("creel").join("creel.db")
}

/// Open the database at `db_path` (creating it if absent), ensure the schema,
/// return the managed pool. The host application calls this once at startup
/// and shares the pool for the process lifetime.
pub fn init_db(db_path: &Path) -> Result<DbPool, AppError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AppError::Storage(e.to_string()))?;
    }
    let mut conn = Connection::open(db_path).map_err(|e| AppError::Storage(e.to_string()))?;
    ensure_schema_conn(&mut conn)?;
    Ok(DbPool(Mutex::new(conn)))
}

/// Create the tables if absent and seed the bootstrap user. Idempotent; safe
/// to call on every app start.
pub fn ensure_schema(pool: &DbPool) -> Result<(), AppError> {
    let mut conn = get_connection(pool);
    ensure_schema_conn(&mut conn)
}

fn ensure_schema_conn(conn: &mut Connection) -> Result<(), AppError> {
    let tx = conn
        .transaction()
        .map_err(|e| AppError::Db(e.to_string()))?;

    // Ensure schema_migrations exists (first run)
    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL DEFAULT (datetime('now')))",
        [],
    )
    .map_err(|e| AppError::Schema(e.to_string()))?;

    let applied: Vec<i32> = tx
        .prepare("SELECT version FROM schema_migrations ORDER BY version")
        .map_err(|e| AppError::Schema(e.to_string()))?
        .query_map([], |r| r.get(0))
        .map_err(|e| AppError::Schema(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Schema(e.to_string()))?;

    const MIGRATIONS: &[(i32, &str)] = &[(1, include_str!("../../migrations/0001_init.sql"))];

    for (version, sql) in MIGRATIONS {
        if applied.contains(version) {
            continue;
        }
        let statements: Vec<&str> = sql
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        for stmt in statements {
            tx.execute(stmt, [])
                .map_err(|e| AppError::Schema(e.to_string()))?;
        }
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )
        .map_err(|e| AppError::Schema(e.to_string()))?;
    }

    // A table left behind by an incompatible build passes CREATE TABLE IF NOT
    // EXISTS untouched; catch it before any query trusts the columns.
    verify_table(
        &tx,
        "user",
        &[
            ("id", "INTEGER"),
            ("name", "TEXT"),
            ("email", "TEXT"),
            ("photo", "TEXT"),
            ("fish_ids", "TEXT"),
            ("is_subscriber", "INTEGER"),
            ("subscribe_at", "TEXT"),
            ("subscribe_period", "INTEGER"),
        ],
    )?;
    verify_table(
        &tx,
        "fish",
        &[
            ("id", "INTEGER"),
            ("name", "TEXT"),
            ("type", "TEXT"),
            ("date", "TEXT"),
            ("latitude", "REAL"),
            ("longitude", "REAL"),
            ("location_name", "TEXT"),
            ("photo", "TEXT"),
            ("notes", "TEXT"),
            ("writer", "INTEGER"),
            ("created_at", "TEXT"),
        ],
    )?;

    tx.execute(
        "INSERT OR IGNORE INTO user (name, email) VALUES (?1, ?2)",
        params![DEFAULT_USER_NAME, DEFAULT_USER_EMAIL],
    )
    .map_err(|e| AppError::Schema(e.to_string()))?;

    tx.commit().map_err(|e| AppError::Schema(e.to_string()))?;
    Ok(())
}

fn verify_table(
    tx: &Transaction<'_>,
    table: &str,
    expected: &[(&str, &str)],
) -> Result<(), AppError> {
    let mut stmt = tx
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(|e| AppError::Schema(e.to_string()))?;
    let cols: Vec<(String, String)> = stmt
        .query_map([], |r| Ok((r.get::<_, String>(1)?, r.get::<_, String>(2)?)))
        .map_err(|e| AppError::Schema(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Schema(e.to_string()))?;

    for (name, decl) in expected {
        match cols.iter().find(|(n, _)| n == name) {
            Some((_, ty)) if ty.eq_ignore_ascii_case(decl) => {}
            Some((_, ty)) => {
                return Err(AppError::Schema(format!(
                    "table {} column {} has type {}, expected {}",
                    table, name, ty, decl
                )))
            }
            None => {
                return Err(AppError::Schema(format!(
                    "table {} is missing column {}",
                    table, name
                )))
            }
        }
    }
    Ok(())
}

/// Drop both tables and the migration bookkeeping so a later `ensure_schema`
/// rebuilds from scratch. Maintenance tooling only, never the normal app flow.
pub fn drop_schema(pool: &DbPool) -> Result<(), AppError> {
    let conn = get_connection(pool);
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| AppError::Db(e.to_string()))?;
    tx.execute("DROP TABLE IF EXISTS fish", [])
        .map_err(|e| AppError::Schema(e.to_string()))?;
    tx.execute("DROP TABLE IF EXISTS user", [])
        .map_err(|e| AppError::Schema(e.to_string()))?;
    tx.execute("DROP TABLE IF EXISTS schema_migrations", [])
        .map_err(|e| AppError::Schema(e.to_string()))?;
    tx.commit().map_err(|e| AppError::Schema(e.to_string()))?;
    Ok(())
}

/// Get connection from pool (for use in the app layer). The guard is the
/// global write lock: multi-statement mutations hold it end to end.
pub fn get_connection(pool: &DbPool) -> std::sync::MutexGuard<'_, Connection> {
    pool.0.lock().expect("db lock")
}

/// In-memory store with the schema applied, for tests.
pub fn init_test_db() -> DbPool {
    let mut conn = Connection::open_in_memory().expect("open in-memory db");
    ensure_schema_conn(&mut conn).expect("schema");
    DbPool(Mutex::new(conn))
}
