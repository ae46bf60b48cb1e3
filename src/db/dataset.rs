use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension};

use super::{id_values, parse_datetime, placeholders, Database};
use crate::error::Result;
use crate::models::{Dataset, DatasetRow, Environment, EnvironmentDataset};
use crate::repository::DatasetRepository;

impl DatasetRepository for Database {
    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<Dataset>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, project_id, name, data_rows, created_at, updated_at
                     FROM tms_dataset WHERE id = ? AND project_id = ?",
                    [id, project_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, project_id, name, rows_json, created_at, updated_at)) = row else {
                return Ok(None);
            };
            let rows: Vec<DatasetRow> = serde_json::from_str(&rows_json)?;
            Ok(Some(Dataset {
                id,
                project_id,
                name,
                rows,
                environments: Vec::new(),
                created_at: parse_datetime(created_at),
                updated_at: parse_datetime(updated_at),
            }))
        })
    }

    fn insert(&self, dataset: &Dataset) -> Result<i64> {
        let rows_json = serde_json::to_string(&dataset.rows)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_dataset (project_id, name, data_rows, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                (
                    dataset.project_id,
                    &dataset.name,
                    &rows_json,
                    dataset.created_at.to_rfc3339(),
                    dataset.updated_at.to_rfc3339(),
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update(&self, dataset: &Dataset) -> Result<()> {
        let rows_json = serde_json::to_string(&dataset.rows)?;
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tms_dataset SET name = ?, data_rows = ?, updated_at = ? WHERE id = ?",
                (
                    &dataset.name,
                    &rows_json,
                    dataset.updated_at.to_rfc3339(),
                    dataset.id,
                ),
            )?;
            Ok(())
        })
    }

    fn delete_by_id(&self, id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let rows = conn.execute("DELETE FROM tms_dataset WHERE id = ?", [id])?;
            Ok(rows)
        })
    }

    fn insert_environment(&self, environment: &Environment) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_environment (project_id, name) VALUES (?, ?)",
                (environment.project_id, &environment.name),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn find_environments_by_id_and_project_id(
        &self,
        ids: &[i64],
        project_id: i64,
    ) -> Result<Vec<Environment>> {
        let mut params = id_values(ids);
        params.push(Value::Integer(project_id));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, project_id, name FROM tms_environment
                 WHERE id IN ({}) AND project_id = ? ORDER BY id",
                placeholders(ids.len())
            ))?;
            let environments = stmt
                .query_map(params_from_iter(params), |row| {
                    Ok(Environment {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(environments)
        })
    }

    fn find_links_by_dataset_id(&self, dataset_id: i64) -> Result<Vec<EnvironmentDataset>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT dataset_id, environment_id FROM tms_environment_dataset
                 WHERE dataset_id = ? ORDER BY environment_id",
            )?;
            let links = stmt
                .query_map([dataset_id], |row| {
                    Ok(EnvironmentDataset {
                        dataset_id: row.get(0)?,
                        environment_id: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(links)
        })
    }

    fn save_links(&self, links: &[EnvironmentDataset]) -> Result<()> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "INSERT OR IGNORE INTO tms_environment_dataset (environment_id, dataset_id) VALUES (?, ?)",
            )?;
            for link in links {
                stmt.execute([link.environment_id, link.dataset_id])?;
            }
            Ok(())
        })
    }

    fn delete_links_by_dataset_id(&self, dataset_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM tms_environment_dataset WHERE dataset_id = ?",
                [dataset_id],
            )?;
            Ok(())
        })
    }
}
