use std::sync::Arc;

use tracing::info;

use super::attribute::AttributeService;
use super::version::TestCaseVersionService;
use crate::error::{Result, TmsError};
use crate::models::{OwnerKind, TestCase, TestCaseInput};
use crate::repository::{CaseScope, TestCaseRepository, TestFolderRepository};

pub struct TestCaseService {
    repo: Arc<dyn TestCaseRepository>,
    folders: Arc<dyn TestFolderRepository>,
    attributes: Arc<AttributeService>,
    versions: Arc<TestCaseVersionService>,
}

impl TestCaseService {
    pub fn new(
        repo: Arc<dyn TestCaseRepository>,
        folders: Arc<dyn TestFolderRepository>,
        attributes: Arc<AttributeService>,
        versions: Arc<TestCaseVersionService>,
    ) -> Self {
        Self {
            repo,
            folders,
            attributes,
            versions,
        }
    }

    /// Creates a test case in an existing folder, with its tags and default version.
    pub fn create(&self, project_id: i64, input: &TestCaseInput) -> Result<TestCase> {
        let folder_id = input
            .test_folder_id
            .ok_or_else(|| TmsError::validation("test folder id is required"))?;
        self.ensure_folder(project_id, folder_id)?;

        let mut test_case = TestCase::from_input(project_id, folder_id, input)?;
        test_case.id = self.repo.insert(&test_case)?;
        self.attributes.create(&mut test_case, &input.tags)?;
        if let Some(version) = &input.default_version {
            self.versions.create(&mut test_case, version)?;
        }

        info!(
            test_case_id = test_case.id,
            project_id,
            folder_id,
            "Created test case"
        );
        Ok(test_case)
    }

    pub fn get_by_id(&self, project_id: i64, id: i64) -> Result<TestCase> {
        let mut test_case = self
            .repo
            .find_by_id(id)?
            .filter(|tc| tc.project_id == project_id)
            .ok_or_else(|| not_found(id, project_id))?;
        self.hydrate(&mut test_case)?;
        Ok(test_case)
    }

    /// Full update. Tags are replaced; the default version is updated or created.
    pub fn update(&self, project_id: i64, id: i64, input: &TestCaseInput) -> Result<TestCase> {
        let mut test_case = self.find_in_project(project_id, id)?;
        if let Some(folder_id) = input.test_folder_id {
            self.ensure_folder(project_id, folder_id)?;
        }

        test_case.update_from(input)?;
        self.repo.update(&test_case)?;
        self.attributes.replace(&mut test_case, &input.tags)?;
        match &input.default_version {
            Some(version) => self.versions.update(&mut test_case, version)?,
            None => test_case.default_version = self.versions.find_default(test_case.id)?,
        }

        info!(test_case_id = id, project_id, "Updated test case");
        Ok(test_case)
    }

    /// Partial update. New tags are added to the existing ones; the default
    /// version must already exist when one is given.
    pub fn patch(&self, project_id: i64, id: i64, input: &TestCaseInput) -> Result<TestCase> {
        let mut test_case = self.find_in_project(project_id, id)?;
        if let Some(folder_id) = input.test_folder_id {
            self.ensure_folder(project_id, folder_id)?;
        }

        test_case.tags = self.attributes.find_all(OwnerKind::TestCase, id)?;
        test_case.patch_from(input);
        self.repo.update(&test_case)?;
        self.attributes.patch(&mut test_case, &input.tags)?;
        match &input.default_version {
            Some(version) => self.versions.patch(&mut test_case, version)?,
            None => test_case.default_version = self.versions.find_default(test_case.id)?,
        }

        info!(test_case_id = id, project_id, "Patched test case");
        Ok(test_case)
    }

    /// Deletes a test case and everything it owns. A missing test case is a no-op.
    pub fn delete(&self, project_id: i64, id: i64) -> Result<()> {
        if self.repo.find_by_id_and_project_id(id, project_id)?.is_none() {
            return Ok(());
        }
        self.delete_by_scope(&CaseScope::TestCase(id))?;
        info!(test_case_id = id, project_id, "Deleted test case");
        Ok(())
    }

    pub fn delete_by_ids(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.delete_by_scope(&CaseScope::TestCases(ids.to_vec()))
    }

    /// Deletes every test case in the folder and its subfolders.
    pub fn delete_by_folder_id(&self, project_id: i64, folder_id: i64) -> Result<()> {
        self.delete_by_scope(&CaseScope::Folder {
            project_id,
            folder_id,
        })
    }

    /// Cascade order: versions (and their scenarios), tags, test cases.
    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        self.versions.delete_by_scope(scope)?;
        self.attributes
            .delete_by_case_scope(OwnerKind::TestCase, scope)?;
        let deleted = self.repo.delete_by_scope(scope)?;
        info!(count = deleted, ?scope, "Deleted test cases");
        Ok(())
    }

    pub fn find_by_folder(&self, project_id: i64, folder_id: i64) -> Result<Vec<TestCase>> {
        self.find_all_by_folder_ids(project_id, &[folder_id])
    }

    /// Hydrated test cases of all given folders, loaded in one query.
    pub fn find_all_by_folder_ids(&self, project_id: i64, folder_ids: &[i64]) -> Result<Vec<TestCase>> {
        if folder_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut test_cases = self.repo.find_all_by_folder_ids(project_id, folder_ids)?;
        for test_case in &mut test_cases {
            self.hydrate(test_case)?;
        }
        Ok(test_cases)
    }

    fn hydrate(&self, test_case: &mut TestCase) -> Result<()> {
        test_case.tags = self.attributes.find_all(OwnerKind::TestCase, test_case.id)?;
        test_case.default_version = self.versions.find_default(test_case.id)?;
        Ok(())
    }

    fn find_in_project(&self, project_id: i64, id: i64) -> Result<TestCase> {
        self.repo
            .find_by_id_and_project_id(id, project_id)?
            .ok_or_else(|| not_found(id, project_id))
    }

    fn ensure_folder(&self, project_id: i64, folder_id: i64) -> Result<()> {
        match self.folders.find_by_id_and_project_id(folder_id, project_id)? {
            Some(_) => Ok(()),
            None => Err(TmsError::not_found(format!(
                "Test folder with id {} not found in project {}",
                folder_id, project_id
            ))),
        }
    }
}

fn not_found(id: i64, project_id: i64) -> TmsError {
    TmsError::not_found(format!(
        "Test case with id {} not found in project {}",
        id, project_id
    ))
}
