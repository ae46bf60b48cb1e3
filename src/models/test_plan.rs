use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attribute::{AttributeInput, AttributeOwner, OwnerAttribute, OwnerKind};
use super::folder::required_name;
use crate::error::Result;

/// A plan of test executions, tagged with attributes and bound to milestones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub attributes: Vec<OwnerAttribute>,
    pub milestones: Vec<Milestone>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlanInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeInput>,
    #[serde(default)]
    pub milestone_ids: Vec<i64>,
}

impl TestPlan {
    pub fn from_input(project_id: i64, input: &TestPlanInput) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: 0,
            project_id,
            name: required_name(input.name.as_deref())?,
            description: input.description.clone(),
            attributes: Vec::new(),
            milestones: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_from(&mut self, input: &TestPlanInput) -> Result<()> {
        self.name = required_name(input.name.as_deref())?;
        self.description = input.description.clone();
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn patch_from(&mut self, input: &TestPlanInput) {
        if let Some(name) = input.name.as_deref().filter(|n| !n.trim().is_empty()) {
            self.name = name.to_string();
        }
        if let Some(description) = &input.description {
            self.description = Some(description.clone());
        }
        self.updated_at = Utc::now();
    }
}

impl AttributeOwner for TestPlan {
    const KIND: OwnerKind = OwnerKind::TestPlan;

    fn owner_id(&self) -> i64 {
        self.id
    }

    fn attributes(&self) -> &[OwnerAttribute] {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Vec<OwnerAttribute> {
        &mut self.attributes
    }
}

/// A project milestone. Test plans attach to milestones through a join owned
/// by the milestone side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneInput {
    pub name: String,
}
