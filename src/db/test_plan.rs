use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension, Row};

use super::{id_values, parse_datetime, placeholders, Database};
use crate::error::Result;
use crate::models::{Milestone, TestPlan};
use crate::repository::{MilestoneRepository, TestPlanRepository};

fn milestone_from_row(row: &Row<'_>) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}

impl TestPlanRepository for Database {
    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<TestPlan>> {
        self.with_conn(|conn| {
            let plan = conn
                .query_row(
                    "SELECT id, project_id, name, description, created_at, updated_at
                     FROM tms_test_plan WHERE id = ? AND project_id = ?",
                    [id, project_id],
                    |row| {
                        Ok(TestPlan {
                            id: row.get(0)?,
                            project_id: row.get(1)?,
                            name: row.get(2)?,
                            description: row.get(3)?,
                            attributes: Vec::new(),
                            milestones: Vec::new(),
                            created_at: parse_datetime(row.get::<_, String>(4)?),
                            updated_at: parse_datetime(row.get::<_, String>(5)?),
                        })
                    },
                )
                .optional()?;
            Ok(plan)
        })
    }

    fn insert(&self, plan: &TestPlan) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_test_plan (project_id, name, description, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                (
                    plan.project_id,
                    &plan.name,
                    &plan.description,
                    plan.created_at.to_rfc3339(),
                    plan.updated_at.to_rfc3339(),
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update(&self, plan: &TestPlan) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tms_test_plan SET name = ?, description = ?, updated_at = ? WHERE id = ?",
                (
                    &plan.name,
                    &plan.description,
                    plan.updated_at.to_rfc3339(),
                    plan.id,
                ),
            )?;
            Ok(())
        })
    }

    fn delete_by_id(&self, id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let rows = conn.execute("DELETE FROM tms_test_plan WHERE id = ?", [id])?;
            Ok(rows)
        })
    }
}

impl MilestoneRepository for Database {
    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<Milestone>> {
        self.with_conn(|conn| {
            let milestone = conn
                .query_row(
                    "SELECT id, project_id, name, created_at FROM tms_milestone
                     WHERE id = ? AND project_id = ?",
                    [id, project_id],
                    milestone_from_row,
                )
                .optional()?;
            Ok(milestone)
        })
    }

    fn find_all_by_id_and_project_id(&self, ids: &[i64], project_id: i64) -> Result<Vec<Milestone>> {
        let mut params = id_values(ids);
        params.push(Value::Integer(project_id));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, project_id, name, created_at FROM tms_milestone
                 WHERE id IN ({}) AND project_id = ? ORDER BY id",
                placeholders(ids.len())
            ))?;
            let milestones = stmt
                .query_map(params_from_iter(params), milestone_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(milestones)
        })
    }

    fn find_all_by_test_plan_id(&self, test_plan_id: i64) -> Result<Vec<Milestone>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.project_id, m.name, m.created_at
                 FROM tms_milestone m
                 JOIN tms_milestone_test_plan mtp ON mtp.milestone_id = m.id
                 WHERE mtp.test_plan_id = ?
                 ORDER BY m.id",
            )?;
            let milestones = stmt
                .query_map([test_plan_id], milestone_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(milestones)
        })
    }

    fn insert(&self, milestone: &Milestone) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_milestone (project_id, name, created_at) VALUES (?, ?, ?)",
                (
                    milestone.project_id,
                    &milestone.name,
                    milestone.created_at.to_rfc3339(),
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn attach_test_plan_to_milestone(&self, milestone_id: i64, test_plan_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO tms_milestone_test_plan (milestone_id, test_plan_id) VALUES (?, ?)",
                [milestone_id, test_plan_id],
            )?;
            Ok(())
        })
    }

    fn detach_test_plan_from_milestones(&self, test_plan_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM tms_milestone_test_plan WHERE test_plan_id = ?",
                [test_plan_id],
            )?;
            Ok(())
        })
    }
}
