use std::sync::Arc;

use tracing::debug;

use super::scenario::ManualScenarioService;
use crate::error::{Result, TmsError};
use crate::models::{TestCase, TestCaseVersion, TestCaseVersionInput};
use crate::repository::{CaseScope, TestCaseVersionRepository};

/// The default version of each test case, and its manual scenario.
pub struct TestCaseVersionService {
    repo: Arc<dyn TestCaseVersionRepository>,
    scenarios: Arc<ManualScenarioService>,
}

impl TestCaseVersionService {
    pub fn new(repo: Arc<dyn TestCaseVersionRepository>, scenarios: Arc<ManualScenarioService>) -> Self {
        Self { repo, scenarios }
    }

    pub fn create(&self, test_case: &mut TestCase, input: &TestCaseVersionInput) -> Result<()> {
        let mut version = TestCaseVersion::new_default(test_case.id, input);
        version.id = self.repo.insert(&version)?;
        if let Some(scenario) = &input.manual_scenario {
            self.scenarios.create(&mut version, scenario)?;
        }

        debug!(version_id = version.id, test_case_id = test_case.id, "Created default version");
        test_case.default_version = Some(version);
        Ok(())
    }

    /// Full update of the default version, creating it when the test case has none.
    ///
    /// An absent scenario in `input` keeps the stored one.
    pub fn update(&self, test_case: &mut TestCase, input: &TestCaseVersionInput) -> Result<()> {
        let Some(mut version) = self.repo.find_default_by_test_case_id(test_case.id)? else {
            return self.create(test_case, input);
        };

        version.update_from(input);
        self.repo.update(&version)?;
        match &input.manual_scenario {
            Some(scenario) => self.scenarios.update(&mut version, scenario)?,
            None => version.manual_scenario = self.scenarios.find_by_version(version.id)?,
        }

        test_case.default_version = Some(version);
        Ok(())
    }

    /// Partial update of the default version. The version must exist.
    pub fn patch(&self, test_case: &mut TestCase, input: &TestCaseVersionInput) -> Result<()> {
        let mut version = self
            .repo
            .find_default_by_test_case_id(test_case.id)?
            .ok_or_else(|| {
                TmsError::not_found(format!(
                    "Default test case version for test case {} not found",
                    test_case.id
                ))
            })?;

        version.patch_from(input);
        self.repo.update(&version)?;
        match &input.manual_scenario {
            Some(scenario) => self.scenarios.patch(&mut version, scenario)?,
            None => version.manual_scenario = self.scenarios.find_by_version(version.id)?,
        }

        test_case.default_version = Some(version);
        Ok(())
    }

    pub fn find_default(&self, test_case_id: i64) -> Result<Option<TestCaseVersion>> {
        let Some(mut version) = self.repo.find_default_by_test_case_id(test_case_id)? else {
            return Ok(None);
        };
        version.manual_scenario = self.scenarios.find_by_version(version.id)?;
        Ok(Some(version))
    }

    /// Deletes scenarios first, then the versions of the test cases in `scope`.
    pub fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        self.scenarios.delete_by_scope(scope)?;
        self.repo.delete_by_scope(scope)
    }

    pub fn delete_by_test_case_id(&self, test_case_id: i64) -> Result<()> {
        self.delete_by_scope(&CaseScope::TestCase(test_case_id))
    }

    pub fn delete_by_test_case_ids(&self, test_case_ids: &[i64]) -> Result<()> {
        if test_case_ids.is_empty() {
            return Ok(());
        }
        self.delete_by_scope(&CaseScope::TestCases(test_case_ids.to_vec()))
    }

    pub fn delete_by_folder_id(&self, project_id: i64, folder_id: i64) -> Result<()> {
        self.delete_by_scope(&CaseScope::Folder {
            project_id,
            folder_id,
        })
    }
}
