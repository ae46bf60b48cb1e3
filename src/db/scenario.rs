use rusqlite::types::Type;
use rusqlite::{params_from_iter, OptionalExtension, Row};

use super::{scenario_ids_sql, Database};
use crate::error::Result;
use crate::models::{Attachment, ManualScenario, ScenarioType, Step, StepsScenario, TextScenario};
use crate::repository::{
    CaseScope, ManualScenarioRepository, StepsScenarioRepository, TextScenarioRepository,
};

fn scenario_type_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<ScenarioType> {
    let value: String = row.get(idx)?;
    ScenarioType::from_str(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown scenario type: {}", value).into(),
        )
    })
}

impl ManualScenarioRepository for Database {
    fn find_by_version_id(&self, version_id: i64) -> Result<Option<ManualScenario>> {
        self.with_conn(|conn| {
            let scenario = conn
                .query_row(
                    "SELECT id, test_case_version_id, type, execution_estimation_time,
                            link_to_requirements, preconditions
                     FROM tms_manual_scenario WHERE test_case_version_id = ?",
                    [version_id],
                    |row| {
                        Ok(ManualScenario {
                            id: row.get(0)?,
                            test_case_version_id: row.get(1)?,
                            scenario_type: scenario_type_column(row, 2)?,
                            execution_estimation_time: row.get(3)?,
                            link_to_requirements: row.get(4)?,
                            preconditions: row.get(5)?,
                            attributes: Vec::new(),
                            variant: None,
                        })
                    },
                )
                .optional()?;
            Ok(scenario)
        })
    }

    fn insert(&self, scenario: &ManualScenario) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_manual_scenario
                    (test_case_version_id, type, execution_estimation_time, link_to_requirements, preconditions)
                 VALUES (?, ?, ?, ?, ?)",
                (
                    scenario.test_case_version_id,
                    scenario.scenario_type.as_str(),
                    scenario.execution_estimation_time,
                    &scenario.link_to_requirements,
                    &scenario.preconditions,
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update(&self, scenario: &ManualScenario) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tms_manual_scenario
                 SET type = ?, execution_estimation_time = ?, link_to_requirements = ?, preconditions = ?
                 WHERE id = ?",
                (
                    scenario.scenario_type.as_str(),
                    scenario.execution_estimation_time,
                    &scenario.link_to_requirements,
                    &scenario.preconditions,
                    scenario.id,
                ),
            )?;
            Ok(())
        })
    }

    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        let (scenarios, params) = scenario_ids_sql(scope);
        self.with_conn(|conn| {
            conn.execute(
                &format!("DELETE FROM tms_manual_scenario WHERE id IN ({})", scenarios),
                params_from_iter(params),
            )?;
            Ok(())
        })
    }
}

impl TextScenarioRepository for Database {
    fn find_by_scenario_id(&self, scenario_id: i64) -> Result<Option<TextScenario>> {
        self.with_conn(|conn| {
            let body = conn
                .query_row(
                    "SELECT instructions, expected_result FROM tms_text_manual_scenario
                     WHERE manual_scenario_id = ?",
                    [scenario_id],
                    |row| {
                        Ok(TextScenario {
                            instructions: row.get(0)?,
                            expected_result: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(body)
        })
    }

    fn save(&self, scenario_id: i64, body: &TextScenario) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tms_text_manual_scenario (manual_scenario_id, instructions, expected_result)
                 VALUES (?, ?, ?)
                 ON CONFLICT(manual_scenario_id) DO UPDATE SET
                    instructions = excluded.instructions,
                    expected_result = excluded.expected_result",
                (scenario_id, &body.instructions, &body.expected_result),
            )?;
            Ok(())
        })
    }

    fn delete_by_scenario_id(&self, scenario_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM tms_text_manual_scenario WHERE manual_scenario_id = ?",
                [scenario_id],
            )?;
            Ok(())
        })
    }

    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        let (scenarios, params) = scenario_ids_sql(scope);
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "DELETE FROM tms_text_manual_scenario WHERE manual_scenario_id IN ({})",
                    scenarios
                ),
                params_from_iter(params),
            )?;
            Ok(())
        })
    }
}

impl StepsScenarioRepository for Database {
    fn find_by_scenario_id(&self, scenario_id: i64) -> Result<Option<StepsScenario>> {
        self.with_conn(|conn| {
            let exists = conn
                .query_row(
                    "SELECT manual_scenario_id FROM tms_steps_manual_scenario WHERE manual_scenario_id = ?",
                    [scenario_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT instructions, expected_result, attachments FROM tms_step
                 WHERE manual_scenario_id = ? ORDER BY position",
            )?;
            let rows = stmt
                .query_map([scenario_id], |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut steps = Vec::with_capacity(rows.len());
            for (instructions, expected_result, attachments_json) in rows {
                let attachments: Vec<Attachment> = serde_json::from_str(&attachments_json)?;
                steps.push(Step {
                    instructions,
                    expected_result,
                    attachments,
                });
            }
            Ok(Some(StepsScenario { steps }))
        })
    }

    fn save(&self, scenario_id: i64, body: &StepsScenario) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO tms_steps_manual_scenario (manual_scenario_id) VALUES (?)",
                [scenario_id],
            )?;
            conn.execute(
                "DELETE FROM tms_step WHERE manual_scenario_id = ?",
                [scenario_id],
            )?;

            let mut stmt = conn.prepare(
                "INSERT INTO tms_step (manual_scenario_id, position, instructions, expected_result, attachments)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            for (position, step) in body.steps.iter().enumerate() {
                stmt.execute((
                    scenario_id,
                    position as i64,
                    &step.instructions,
                    &step.expected_result,
                    serde_json::to_string(&step.attachments)?,
                ))?;
            }
            Ok(())
        })
    }

    fn delete_by_scenario_id(&self, scenario_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM tms_step WHERE manual_scenario_id = ?",
                [scenario_id],
            )?;
            conn.execute(
                "DELETE FROM tms_steps_manual_scenario WHERE manual_scenario_id = ?",
                [scenario_id],
            )?;
            Ok(())
        })
    }

    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        let (scenarios, params) = scenario_ids_sql(scope);
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "DELETE FROM tms_step WHERE manual_scenario_id IN ({})",
                    scenarios
                ),
                params_from_iter(params.clone()),
            )?;
            conn.execute(
                &format!(
                    "DELETE FROM tms_steps_manual_scenario WHERE manual_scenario_id IN ({})",
                    scenarios
                ),
                params_from_iter(params),
            )?;
            Ok(())
        })
    }
}
