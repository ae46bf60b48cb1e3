//! SQLite implementation of the repository traits.
//!
//! One connection is shared behind a re-entrant lock. [`Database::transaction`]
//! holds that lock for the whole closure, so every repository call made by a
//! service operation runs inside the same savepoint.

mod attribute;
mod dataset;
mod folder;
mod scenario;
mod schema;
mod test_case;
mod test_plan;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::ReentrantMutex;
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::config::TmsConfig;
use crate::error::Result;
use crate::repository::CaseScope;

pub struct Database {
    conn: Arc<ReentrantMutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(TmsConfig::default_database_path()?)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        // Deletion order is enforced by foreign keys; nothing cascades.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(ReentrantMutex::new(conn)),
        })
    }

    /// Brings the schema up to date and returns the number of migrations applied.
    pub fn migrate(&self) -> anyhow::Result<usize> {
        let conn = self.conn.lock();
        schema::run_migrations(&conn)
    }

    /// Runs `f` atomically: all writes commit together or roll back together.
    ///
    /// Nested calls create nested savepoints.
    pub fn transaction<T, E>(&self, f: impl FnOnce() -> std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let conn = self.conn.lock();
        conn.execute_batch("SAVEPOINT tms_tx")?;
        match f() {
            Ok(value) => {
                conn.execute_batch("RELEASE tms_tx")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = conn.execute_batch("ROLLBACK TO tms_tx; RELEASE tms_tx") {
                    tracing::error!(error = %rollback, "Failed to roll back transaction");
                }
                Err(e)
            }
        }
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock();
        f(&conn)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Recursive query selecting a folder and all of its descendants.
/// Parameters: root id, project id.
const SUBTREE_SQL: &str = "WITH RECURSIVE subtree(id) AS (
        SELECT id FROM tms_test_folder WHERE id = ? AND project_id = ?
        UNION
        SELECT f.id FROM tms_test_folder f JOIN subtree s ON f.parent_id = s.id
    )
    SELECT id FROM subtree";

/// `?, ?, ?` for `n` parameters. An empty list matches nothing.
fn placeholders(n: usize) -> String {
    if n == 0 {
        return "NULL".to_string();
    }
    vec!["?"; n].join(", ")
}

fn id_values(ids: &[i64]) -> Vec<Value> {
    ids.iter().map(|id| Value::Integer(*id)).collect()
}

/// SQL selecting the ids of the test cases in `scope`, with its parameters.
fn case_ids_sql(scope: &CaseScope) -> (String, Vec<Value>) {
    match scope {
        CaseScope::TestCase(id) => (
            "SELECT id FROM tms_test_case WHERE id = ?".to_string(),
            vec![Value::Integer(*id)],
        ),
        CaseScope::TestCases(ids) => (
            format!(
                "SELECT id FROM tms_test_case WHERE id IN ({})",
                placeholders(ids.len())
            ),
            id_values(ids),
        ),
        CaseScope::Folder {
            project_id,
            folder_id,
        } => (
            format!(
                "SELECT id FROM tms_test_case WHERE project_id = ? AND test_folder_id IN ({})",
                SUBTREE_SQL
            ),
            vec![
                Value::Integer(*project_id),
                Value::Integer(*folder_id),
                Value::Integer(*project_id),
            ],
        ),
    }
}

/// SQL selecting the ids of every manual scenario attached to a version of a
/// test case in `scope`.
fn scenario_ids_sql(scope: &CaseScope) -> (String, Vec<Value>) {
    let (cases, params) = case_ids_sql(scope);
    (
        format!(
            "SELECT s.id FROM tms_manual_scenario s
             JOIN tms_test_case_version v ON v.id = s.test_case_version_id
             WHERE v.test_case_id IN ({})",
            cases
        ),
        params,
    )
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
