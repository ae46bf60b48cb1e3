use rusqlite::{params_from_iter, OptionalExtension, Row};

use super::{id_values, parse_datetime, placeholders, Database, SUBTREE_SQL};
use crate::error::Result;
use crate::models::TestFolder;
use crate::repository::TestFolderRepository;

const FOLDER_COLUMNS: &str = "id, project_id, name, description, parent_id, created_at, updated_at";

fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<TestFolder> {
    Ok(TestFolder {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        parent_folder_id: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

impl TestFolderRepository for Database {
    fn find_by_id(&self, id: i64) -> Result<Option<TestFolder>> {
        self.with_conn(|conn| {
            let folder = conn
                .query_row(
                    &format!("SELECT {} FROM tms_test_folder WHERE id = ?", FOLDER_COLUMNS),
                    [id],
                    folder_from_row,
                )
                .optional()?;
            Ok(folder)
        })
    }

    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<TestFolder>> {
        self.with_conn(|conn| {
            let folder = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM tms_test_folder WHERE id = ? AND project_id = ?",
                        FOLDER_COLUMNS
                    ),
                    [id, project_id],
                    folder_from_row,
                )
                .optional()?;
            Ok(folder)
        })
    }

    fn find_by_name_and_project_id(
        &self,
        name: &str,
        project_id: i64,
    ) -> Result<Option<TestFolder>> {
        self.with_conn(|conn| {
            // Oldest match wins when names repeat across branches.
            let folder = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM tms_test_folder WHERE name = ? AND project_id = ? ORDER BY id LIMIT 1",
                        FOLDER_COLUMNS
                    ),
                    (name, project_id),
                    folder_from_row,
                )
                .optional()?;
            Ok(folder)
        })
    }

    fn find_all_by_project_id(&self, project_id: i64) -> Result<Vec<TestFolder>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM tms_test_folder WHERE project_id = ? ORDER BY name, id",
                FOLDER_COLUMNS
            ))?;
            let folders = stmt
                .query_map([project_id], folder_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(folders)
        })
    }

    fn find_all_by_id(&self, ids: &[i64]) -> Result<Vec<TestFolder>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM tms_test_folder WHERE id IN ({}) ORDER BY name, id",
                FOLDER_COLUMNS,
                placeholders(ids.len())
            ))?;
            let folders = stmt
                .query_map(params_from_iter(id_values(ids)), folder_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(folders)
        })
    }

    fn find_all_folder_ids_in_hierarchy(&self, project_id: i64, root_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(SUBTREE_SQL)?;
            let ids = stmt
                .query_map([root_id, project_id], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    fn insert(&self, folder: &TestFolder) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_test_folder (project_id, name, description, parent_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    folder.project_id,
                    &folder.name,
                    &folder.description,
                    folder.parent_folder_id,
                    folder.created_at.to_rfc3339(),
                    folder.updated_at.to_rfc3339(),
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update(&self, folder: &TestFolder) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tms_test_folder SET name = ?, description = ?, parent_id = ?, updated_at = ?
                 WHERE id = ? AND project_id = ?",
                (
                    &folder.name,
                    &folder.description,
                    folder.parent_folder_id,
                    folder.updated_at.to_rfc3339(),
                    folder.id,
                    folder.project_id,
                ),
            )?;
            Ok(())
        })
    }

    fn delete_test_folder_with_subfolders_by_id(&self, project_id: i64, id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                &format!("DELETE FROM tms_test_folder WHERE id IN ({})", SUBTREE_SQL),
                [id, project_id],
            )?;
            Ok(rows)
        })
    }
}
