use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::folder::required_name;
use crate::error::Result;

/// One row of a dataset: parameter name to value.
pub type DatasetRow = BTreeMap<String, String>;

/// An execution environment that datasets can be bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInput {
    pub name: String,
}

/// Join record binding a dataset to an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDataset {
    pub dataset_id: i64,
    pub environment_id: i64,
}

/// Parameter rows for data-driven manual tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub rows: Vec<DatasetRow>,
    pub environments: Vec<EnvironmentDataset>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInput {
    pub name: Option<String>,
    pub rows: Option<Vec<DatasetRow>>,
    #[serde(default)]
    pub environment_ids: Vec<i64>,
}

impl Dataset {
    pub fn from_input(project_id: i64, input: &DatasetInput) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: 0,
            project_id,
            name: required_name(input.name.as_deref())?,
            rows: input.rows.clone().unwrap_or_default(),
            environments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_from(&mut self, input: &DatasetInput) -> Result<()> {
        self.name = required_name(input.name.as_deref())?;
        self.rows = input.rows.clone().unwrap_or_default();
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn patch_from(&mut self, input: &DatasetInput) {
        if let Some(name) = input.name.as_deref().filter(|n| !n.trim().is_empty()) {
            self.name = name.to_string();
        }
        if let Some(rows) = &input.rows {
            self.rows = rows.clone();
        }
        self.updated_at = Utc::now();
    }
}
