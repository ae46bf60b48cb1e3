use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attribute::{AttributeInput, AttributeOwner, OwnerAttribute, OwnerKind};
use super::folder::required_name;
use super::version::{TestCaseVersion, TestCaseVersionInput};
use crate::error::Result;

/// A manually executed test case, owned by exactly one folder.
///
/// `tags` and `default_version` are hydrated by the service layer; storage
/// keeps them in their own tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    pub project_id: i64,
    pub test_folder_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<OwnerAttribute>,
    pub default_version: Option<TestCaseVersion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating, updating or patching a test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseInput {
    pub test_folder_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<AttributeInput>,
    pub default_version: Option<TestCaseVersionInput>,
}

impl TestCase {
    pub fn from_input(project_id: i64, test_folder_id: i64, input: &TestCaseInput) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: 0,
            project_id,
            test_folder_id,
            name: required_name(input.name.as_deref())?,
            description: input.description.clone(),
            tags: Vec::new(),
            default_version: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_from(&mut self, input: &TestCaseInput) -> Result<()> {
        self.name = required_name(input.name.as_deref())?;
        self.description = input.description.clone();
        if let Some(folder_id) = input.test_folder_id {
            self.test_folder_id = folder_id;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn patch_from(&mut self, input: &TestCaseInput) {
        if let Some(name) = input.name.as_deref().filter(|n| !n.trim().is_empty()) {
            self.name = name.to_string();
        }
        if let Some(description) = &input.description {
            self.description = Some(description.clone());
        }
        if let Some(folder_id) = input.test_folder_id {
            self.test_folder_id = folder_id;
        }
        self.updated_at = Utc::now();
    }
}

impl AttributeOwner for TestCase {
    const KIND: OwnerKind = OwnerKind::TestCase;

    fn owner_id(&self) -> i64 {
        self.id
    }

    fn attributes(&self) -> &[OwnerAttribute] {
        &self.tags
    }

    fn attributes_mut(&mut self) -> &mut Vec<OwnerAttribute> {
        &mut self.tags
    }
}
