use std::path::Path;

use rusqlite::{params, Connection};

use super::DatabaseError;

/// A numbered schema step embedded at compile time.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial",
        sql: include_str!("../../resources/migrations/001_initial.sql"),
    },
    Migration {
        version: 2,
        name: "calendar_sync",
        sql: include_str!("../../resources/migrations/002_calendar_sync.sql"),
    },
];

/// Open the portal database at `path`, creating and migrating it as needed.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    prepare(conn)
}

/// In-memory database with the full schema. Used by tests.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    prepare(conn)
}

fn prepare(conn: Connection) -> Result<Connection, DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    apply_pending(conn, MIGRATIONS)
}

fn apply_pending(conn: &Connection, migrations: &[Migration]) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             applied_at TEXT NOT NULL DEFAULT (datetime('now'))
         );",
    )?;
    let current = get_current_version(conn);
    for migration in migrations.iter().filter(|m| m.version > current) {
        apply(conn, migration)?;
    }
    Ok(())
}

/// One migration and its version row commit together or not at all.
fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    tracing::info!(
        version = migration.version,
        name = migration.name,
        "Applying schema migration"
    );
    let failed = |e: rusqlite::Error| DatabaseError::MigrationFailed {
        version: migration.version,
        reason: e.to_string(),
    };

    let tx = conn.unchecked_transaction().map_err(failed)?;
    tx.execute_batch(migration.sql).map_err(failed)?;
    tx.execute(
        "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
        params![migration.version, migration.name],
    )
    .map_err(failed)?;
    tx.commit().map_err(failed)
}

/// Highest applied migration, 0 for a fresh database.
pub fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}
