use rusqlite::params_from_iter;
use rusqlite::types::Value;

use super::{case_ids_sql, id_values, placeholders, scenario_ids_sql, Database};
use crate::error::{Result, TmsError};
use crate::models::{Attribute, OwnerAttribute, OwnerKind};
use crate::repository::{AttributeRepository, CaseScope, OwnerAttributeRepository};

impl AttributeRepository for Database {
    fn find_all_by_id(&self, ids: &[i64]) -> Result<Vec<Attribute>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, key FROM tms_attribute WHERE id IN ({}) ORDER BY id",
                placeholders(ids.len())
            ))?;
            let attributes = stmt
                .query_map(params_from_iter(id_values(ids)), |row| {
                    Ok(Attribute {
                        id: row.get(0)?,
                        key: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(attributes)
        })
    }

    fn find_all_by_key(&self, keys: &[String]) -> Result<Vec<Attribute>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, key FROM tms_attribute WHERE key IN ({}) ORDER BY id",
                placeholders(keys.len())
            ))?;
            let attributes = stmt
                .query_map(params_from_iter(keys.iter()), |row| {
                    Ok(Attribute {
                        id: row.get(0)?,
                        key: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(attributes)
        })
    }

    fn save_all(&self, keys: &[String]) -> Result<Vec<Attribute>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("INSERT INTO tms_attribute (key) VALUES (?)")?;
            let mut saved = Vec::with_capacity(keys.len());
            for key in keys {
                let id = stmt.insert([key])?;
                saved.push(Attribute {
                    id,
                    key: key.clone(),
                });
            }
            Ok(saved)
        })
    }
}

impl OwnerAttributeRepository for Database {
    fn find_all_by_owner(&self, kind: OwnerKind, owner_id: i64) -> Result<Vec<OwnerAttribute>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT oa.owner_id, oa.attribute_id, a.key, oa.value
                 FROM tms_owner_attribute oa
                 JOIN tms_attribute a ON a.id = oa.attribute_id
                 WHERE oa.owner_kind = ? AND oa.owner_id = ?
                 ORDER BY oa.id",
            )?;
            let records = stmt
                .query_map((kind.as_str(), owner_id), |row| {
                    Ok(OwnerAttribute {
                        owner_id: row.get(0)?,
                        attribute_id: row.get(1)?,
                        key: row.get(2)?,
                        value: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    fn save_all(&self, kind: OwnerKind, records: &[OwnerAttribute]) -> Result<()> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "INSERT INTO tms_owner_attribute (owner_kind, owner_id, attribute_id, value)
                 VALUES (?, ?, ?, ?)",
            )?;
            for record in records {
                stmt.execute((
                    kind.as_str(),
                    record.owner_id,
                    record.attribute_id,
                    &record.value,
                ))?;
            }
            Ok(())
        })
    }

    fn delete_all_by_owner(&self, kind: OwnerKind, owner_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM tms_owner_attribute WHERE owner_kind = ? AND owner_id = ?",
                (kind.as_str(), owner_id),
            )?;
            Ok(())
        })
    }

    fn delete_by_case_scope(&self, kind: OwnerKind, scope: &CaseScope) -> Result<()> {
        let (owners, owner_params) = match kind {
            OwnerKind::TestCase => case_ids_sql(scope),
            OwnerKind::ManualScenario => scenario_ids_sql(scope),
            OwnerKind::TestPlan => {
                return Err(TmsError::validation(
                    "test plan attributes are not scoped by test case",
                ))
            }
        };

        let mut params = vec![Value::Text(kind.as_str().to_string())];
        params.extend(owner_params);

        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "DELETE FROM tms_owner_attribute WHERE owner_kind = ? AND owner_id IN ({})",
                    owners
                ),
                params_from_iter(params),
            )?;
            Ok(())
        })
    }
}
