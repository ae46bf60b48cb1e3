use rusqlite::{params_from_iter, OptionalExtension, Row};
use rusqlite::types::Value;

use super::{case_ids_sql, id_values, parse_datetime, placeholders, Database};
use crate::error::Result;
use crate::models::{TestCase, TestCaseVersion};
use crate::repository::{CaseScope, TestCaseRepository, TestCaseVersionRepository};

const TEST_CASE_COLUMNS: &str =
    "id, project_id, test_folder_id, name, description, created_at, updated_at";

fn test_case_from_row(row: &Row<'_>) -> rusqlite::Result<TestCase> {
    Ok(TestCase {
        id: row.get(0)?,
        project_id: row.get(1)?,
        test_folder_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        tags: Vec::new(),
        default_version: None,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

impl TestCaseRepository for Database {
    fn find_by_id(&self, id: i64) -> Result<Option<TestCase>> {
        self.with_conn(|conn| {
            let test_case = conn
                .query_row(
                    &format!("SELECT {} FROM tms_test_case WHERE id = ?", TEST_CASE_COLUMNS),
                    [id],
                    test_case_from_row,
                )
                .optional()?;
            Ok(test_case)
        })
    }

    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<TestCase>> {
        self.with_conn(|conn| {
            let test_case = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM tms_test_case WHERE id = ? AND project_id = ?",
                        TEST_CASE_COLUMNS
                    ),
                    [id, project_id],
                    test_case_from_row,
                )
                .optional()?;
            Ok(test_case)
        })
    }

    fn find_all_by_folder_ids(&self, project_id: i64, folder_ids: &[i64]) -> Result<Vec<TestCase>> {
        let mut params = vec![Value::Integer(project_id)];
        params.extend(id_values(folder_ids));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM tms_test_case
                 WHERE project_id = ? AND test_folder_id IN ({})
                 ORDER BY name, id",
                TEST_CASE_COLUMNS,
                placeholders(folder_ids.len())
            ))?;
            let test_cases = stmt
                .query_map(params_from_iter(params), test_case_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(test_cases)
        })
    }

    fn insert(&self, test_case: &TestCase) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_test_case (project_id, test_folder_id, name, description, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    test_case.project_id,
                    test_case.test_folder_id,
                    &test_case.name,
                    &test_case.description,
                    test_case.created_at.to_rfc3339(),
                    test_case.updated_at.to_rfc3339(),
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update(&self, test_case: &TestCase) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tms_test_case SET test_folder_id = ?, name = ?, description = ?, updated_at = ?
                 WHERE id = ?",
                (
                    test_case.test_folder_id,
                    &test_case.name,
                    &test_case.description,
                    test_case.updated_at.to_rfc3339(),
                    test_case.id,
                ),
            )?;
            Ok(())
        })
    }

    fn delete_by_scope(&self, scope: &CaseScope) -> Result<usize> {
        let (cases, params) = case_ids_sql(scope);
        self.with_conn(|conn| {
            let rows = conn.execute(
                &format!("DELETE FROM tms_test_case WHERE id IN ({})", cases),
                params_from_iter(params),
            )?;
            Ok(rows)
        })
    }
}

impl TestCaseVersionRepository for Database {
    fn find_default_by_test_case_id(&self, test_case_id: i64) -> Result<Option<TestCaseVersion>> {
        self.with_conn(|conn| {
            let version = conn
                .query_row(
                    "SELECT id, test_case_id, name, is_default FROM tms_test_case_version
                     WHERE test_case_id = ? AND is_default = 1",
                    [test_case_id],
                    |row| {
                        Ok(TestCaseVersion {
                            id: row.get(0)?,
                            test_case_id: row.get(1)?,
                            name: row.get(2)?,
                            is_default: row.get::<_, i32>(3)? != 0,
                            manual_scenario: None,
                        })
                    },
                )
                .optional()?;
            Ok(version)
        })
    }

    fn insert(&self, version: &TestCaseVersion) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_test_case_version (test_case_id, name, is_default) VALUES (?, ?, ?)",
                (
                    version.test_case_id,
                    &version.name,
                    if version.is_default { 1 } else { 0 },
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update(&self, version: &TestCaseVersion) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tms_test_case_version SET name = ?, is_default = ? WHERE id = ?",
                (
                    &version.name,
                    if version.is_default { 1 } else { 0 },
                    version.id,
                ),
            )?;
            Ok(())
        })
    }

    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        let (cases, params) = case_ids_sql(scope);
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "DELETE FROM tms_test_case_version WHERE test_case_id IN ({})",
                    cases
                ),
                params_from_iter(params),
            )?;
            Ok(())
        })
    }
}
