use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::test_case::TestCase;
use crate::error::{Result, TmsError};

/// A folder of manual test cases.
///
/// Folders form a forest per project via `parent_folder_id`; root folders have
/// no parent. A folder is never its own ancestor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestFolder {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parent_folder_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference to a parent folder by name. A missing folder is created as a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentFolderInput {
    pub name: String,
    pub description: Option<String>,
}

/// Input for creating, updating or patching a folder.
///
/// The parent is given either by `parent_test_folder_id` or by
/// `parent_test_folder`, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFolderInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_test_folder_id: Option<i64>,
    pub parent_test_folder: Option<ParentFolderInput>,
}

impl TestFolderInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn validate_parent(&self) -> Result<()> {
        if self.parent_test_folder_id.is_some() && self.parent_test_folder.is_some() {
            return Err(TmsError::validation(
                "parent folder must be referenced either by id or by name, not both",
            ));
        }
        Ok(())
    }
}

impl TestFolder {
    pub fn from_input(project_id: i64, input: &TestFolderInput) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: 0,
            project_id,
            name: required_name(input.name.as_deref())?,
            description: input.description.clone(),
            parent_folder_id: input.parent_test_folder_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Full copy: absent optional fields are cleared.
    pub fn update_from(&mut self, input: &TestFolderInput) -> Result<()> {
        self.name = required_name(input.name.as_deref())?;
        self.description = input.description.clone();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Copies only the fields present in `input`.
    pub fn patch_from(&mut self, input: &TestFolderInput) {
        if let Some(name) = input.name.as_deref().filter(|n| !n.trim().is_empty()) {
            self.name = name.to_string();
        }
        if let Some(description) = &input.description {
            self.description = Some(description.clone());
        }
        self.updated_at = Utc::now();
    }
}

pub(crate) fn required_name(name: Option<&str>) -> Result<String> {
    match name {
        Some(n) if !n.trim().is_empty() => Ok(n.to_string()),
        _ => Err(TmsError::validation("name must not be blank")),
    }
}

/// A folder with its nested subfolders, used for hierarchy responses and export.
///
/// `test_cases` is only populated by export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestFolderNode {
    #[serde(flatten)]
    pub folder: TestFolder,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_cases: Vec<TestCase>,
    pub sub_test_folders: Vec<TestFolderNode>,
}

impl TestFolderNode {
    pub fn leaf(folder: TestFolder) -> Self {
        Self {
            folder,
            test_cases: Vec::new(),
            sub_test_folders: Vec::new(),
        }
    }

    /// Depth-first iteration over this node and every descendant.
    pub fn walk(&self) -> Vec<&TestFolderNode> {
        let mut out = vec![self];
        for child in &self.sub_test_folders {
            out.extend(child.walk());
        }
        out
    }
}
