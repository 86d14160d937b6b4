// Database migrations for rapport
// Creates and updates the database schema

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all necessary migrations to bring the database up to date
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get::<_, i32>(0).map(|count| count > 0),
        )
        .context("Failed to check for schema_version table")?;

    if !table_exists {
        return Ok(0);
    }

    conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .context("Failed to read schema version")
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])
        .context("Failed to clear schema version")?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )
    .context("Failed to write schema version")?;
    Ok(())
}

/// v1: schema_version bookkeeping plus the profiles table. Each profile is
/// stored as one whole JSON document; list-view columns are duplicated out
/// of the document for cheap summaries.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .context("Failed to create schema_version table")?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            meeting_count INTEGER NOT NULL DEFAULT 0,
            document TEXT NOT NULL
        )
        "#,
        [],
    )
    .context("Failed to create profiles table")?;

    set_schema_version(conn, SCHEMA_VERSION)?;
    log::info!("Migrated database to schema v{}", SCHEMA_VERSION);
    Ok(())
}
