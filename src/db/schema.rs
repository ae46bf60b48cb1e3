use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
    },
    Migration {
        version: "002",
        name: "test_plans_and_datasets",
        sql: include_str!("migrations/002_test_plans_and_datasets.sql"),
    },
];

/// Applies every pending migration and returns how many ran.
///
/// Each migration commits together with its `tms_schema_migrations` row. A
/// database that records a version this build does not know is refused.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tms_schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create tms_schema_migrations table")?;

    let applied = applied_versions(conn)?;
    if let Some(unknown) = applied
        .iter()
        .find(|v| !MIGRATIONS.iter().any(|m| m.version == v.as_str()))
    {
        bail!("Database schema version {} is newer than this build supports", unknown);
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(m.version))
        .collect();
    for migration in &pending {
        apply(conn, migration)?;
    }

    if !pending.is_empty() {
        tracing::info!(count = pending.len(), "Database schema migrated");
    }
    Ok(pending.len())
}

fn applied_versions(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT version FROM tms_schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<BTreeSet<String>>>()?;
    Ok(versions)
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::debug!(version = migration.version, name = migration.name, "Applying migration");

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)
        .with_context(|| format!("Failed to apply migration {}_{}", migration.version, migration.name))?;
    tx.execute(
        "INSERT INTO tms_schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (migration.version, migration.name, chrono::Utc::now().to_rfc3339()),
    )?;
    tx.commit()?;
    Ok(())
}
