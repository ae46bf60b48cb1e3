use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info};

use super::test_case::TestCaseService;
use crate::error::{Result, TmsError};
use crate::export::{exporter_for, FileType};
use crate::models::{TestCase, TestFolder, TestFolderInput, TestFolderNode};
use crate::repository::TestFolderRepository;

/// Folder CRUD, hierarchy reads, export and cascading delete.
pub struct TestFolderHierarchyService {
    repo: Arc<dyn TestFolderRepository>,
    test_cases: Arc<TestCaseService>,
}

impl TestFolderHierarchyService {
    pub fn new(repo: Arc<dyn TestFolderRepository>, test_cases: Arc<TestCaseService>) -> Self {
        Self { repo, test_cases }
    }

    /// Creates a folder. A parent named but not found is created as a root first.
    pub fn create(&self, project_id: i64, input: &TestFolderInput) -> Result<TestFolder> {
        input.validate_parent()?;
        let parent_id = self.resolve_parent(project_id, input)?;

        let mut folder = TestFolder::from_input(project_id, input)?;
        folder.parent_folder_id = parent_id;
        folder.id = self.repo.insert(&folder)?;

        info!(folder_id = folder.id, project_id, ?parent_id, "Created test folder");
        Ok(folder)
    }

    pub fn get_by_id(&self, project_id: i64, id: i64) -> Result<TestFolder> {
        self.repo
            .find_by_id_and_project_id(id, project_id)?
            .ok_or_else(|| not_found(id, project_id))
    }

    pub fn find_all(&self, project_id: i64) -> Result<Vec<TestFolder>> {
        self.repo.find_all_by_project_id(project_id)
    }

    /// Full update of a folder. An unknown id creates a new folder instead.
    pub fn update(&self, project_id: i64, id: i64, input: &TestFolderInput) -> Result<TestFolder> {
        input.validate_parent()?;
        let Some(mut folder) = self.repo.find_by_id_and_project_id(id, project_id)? else {
            debug!(folder_id = id, project_id, "Folder to update not found, creating it");
            return self.create(project_id, input);
        };

        folder.update_from(input)?;
        let parent_id = self.resolve_parent(project_id, input)?;
        self.ensure_not_descendant(project_id, id, parent_id)?;
        folder.parent_folder_id = parent_id;
        self.repo.update(&folder)?;

        info!(folder_id = id, project_id, "Updated test folder");
        Ok(folder)
    }

    /// Partial update. The parent only changes when one is given.
    pub fn patch(&self, project_id: i64, id: i64, input: &TestFolderInput) -> Result<TestFolder> {
        input.validate_parent()?;
        let mut folder = self
            .repo
            .find_by_id_and_project_id(id, project_id)?
            .ok_or_else(|| not_found(id, project_id))?;

        folder.patch_from(input);
        if input.parent_test_folder_id.is_some() || input.parent_test_folder.is_some() {
            let parent_id = self.resolve_parent(project_id, input)?;
            self.ensure_not_descendant(project_id, id, parent_id)?;
            folder.parent_folder_id = parent_id;
        }
        self.repo.update(&folder)?;

        info!(folder_id = id, project_id, "Patched test folder");
        Ok(folder)
    }

    /// Loads the folder and every descendant as a tree.
    pub fn find_folder_with_full_hierarchy(
        &self,
        project_id: i64,
        folder_id: i64,
    ) -> Result<TestFolderNode> {
        let ids = self
            .repo
            .find_all_folder_ids_in_hierarchy(project_id, folder_id)?;
        if ids.is_empty() {
            return Err(not_found(folder_id, project_id));
        }
        let folders = self.repo.find_all_by_id(&ids)?;
        build_hierarchy(folder_id, folders).ok_or_else(|| not_found(folder_id, project_id))
    }

    /// Writes the folder's subtree, with the test cases of every folder, in `file_type`.
    pub fn export(
        &self,
        project_id: i64,
        folder_id: i64,
        file_type: FileType,
        sink: &mut dyn Write,
    ) -> Result<()> {
        let mut tree = self.find_folder_with_full_hierarchy(project_id, folder_id)?;
        let folder_ids: Vec<i64> = tree.walk().iter().map(|node| node.folder.id).collect();

        let mut by_folder: HashMap<i64, Vec<TestCase>> = HashMap::new();
        for test_case in self
            .test_cases
            .find_all_by_folder_ids(project_id, &folder_ids)?
        {
            by_folder
                .entry(test_case.test_folder_id)
                .or_default()
                .push(test_case);
        }
        attach_test_cases(&mut tree, &mut by_folder);

        info!(
            folder_id,
            project_id,
            folders = folder_ids.len(),
            format = file_type.as_str(),
            "Exporting test folder"
        );
        exporter_for(file_type).export(&tree, sink)
    }

    /// Deletes the folder, its subfolders and every test case under them.
    /// A missing folder is a no-op.
    pub fn delete(&self, project_id: i64, folder_id: i64) -> Result<()> {
        if self
            .repo
            .find_by_id_and_project_id(folder_id, project_id)?
            .is_none()
        {
            return Ok(());
        }

        self.test_cases.delete_by_folder_id(project_id, folder_id)?;
        let deleted = self
            .repo
            .delete_test_folder_with_subfolders_by_id(project_id, folder_id)?;

        info!(folder_id, project_id, folders = deleted, "Deleted test folder");
        Ok(())
    }

    fn resolve_parent(&self, project_id: i64, input: &TestFolderInput) -> Result<Option<i64>> {
        if let Some(parent_id) = input.parent_test_folder_id {
            return match self.repo.find_by_id_and_project_id(parent_id, project_id)? {
                Some(parent) => Ok(Some(parent.id)),
                None => Err(TmsError::not_found(format!(
                    "Parent test folder with id {} not found in project {}",
                    parent_id, project_id
                ))),
            };
        }

        let Some(parent) = &input.parent_test_folder else {
            return Ok(None);
        };
        if let Some(existing) = self
            .repo
            .find_by_name_and_project_id(&parent.name, project_id)?
        {
            return Ok(Some(existing.id));
        }

        let root = self.create(
            project_id,
            &TestFolderInput {
                name: Some(parent.name.clone()),
                description: parent.description.clone(),
                ..Default::default()
            },
        )?;
        Ok(Some(root.id))
    }

    fn ensure_not_descendant(
        &self,
        project_id: i64,
        folder_id: i64,
        parent_id: Option<i64>,
    ) -> Result<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        let subtree = self
            .repo
            .find_all_folder_ids_in_hierarchy(project_id, folder_id)?;
        if subtree.contains(&parent_id) {
            return Err(TmsError::validation(format!(
                "test folder {} cannot be moved under itself or its descendant {}",
                folder_id, parent_id
            )));
        }
        Ok(())
    }
}

fn not_found(id: i64, project_id: i64) -> TmsError {
    TmsError::not_found(format!(
        "Test folder with id {} not found in project {}",
        id, project_id
    ))
}

/// Builds the tree rooted at `root_id` from a flat list of folders.
fn build_hierarchy(root_id: i64, folders: Vec<TestFolder>) -> Option<TestFolderNode> {
    let mut root = None;
    let mut children_map: HashMap<i64, Vec<TestFolder>> = HashMap::new();
    for folder in folders {
        if folder.id == root_id {
            root = Some(folder);
        } else if let Some(parent_id) = folder.parent_folder_id {
            children_map.entry(parent_id).or_default().push(folder);
        }
    }

    // Removing each bucket as it is consumed keeps the walk finite.
    fn build_subtree(
        folder: TestFolder,
        children_map: &mut HashMap<i64, Vec<TestFolder>>,
    ) -> TestFolderNode {
        let children = children_map.remove(&folder.id).unwrap_or_default();
        let mut node = TestFolderNode::leaf(folder);
        node.sub_test_folders = children
            .into_iter()
            .map(|child| build_subtree(child, children_map))
            .collect();
        node
    }

    root.map(|folder| build_subtree(folder, &mut children_map))
}

fn attach_test_cases(node: &mut TestFolderNode, by_folder: &mut HashMap<i64, Vec<TestCase>>) {
    node.test_cases = by_folder.remove(&node.folder.id).unwrap_or_default();
    for child in &mut node.sub_test_folders {
        attach_test_cases(child, by_folder);
    }
}
