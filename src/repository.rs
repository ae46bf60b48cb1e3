//! Persistence contracts.
//!
//! Services depend on these traits rather than on [`crate::db::Database`], so
//! they can be exercised against mocks. The SQLite implementation lives in
//! `db/`.
//!
//! No storage-level cascade is assumed: every service deletes its children
//! before deleting itself.

use crate::error::Result;
use crate::models::*;

/// The set of test cases a cascading delete applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseScope {
    TestCase(i64),
    TestCases(Vec<i64>),
    /// Every test case in the folder and all of its subfolders.
    Folder { project_id: i64, folder_id: i64 },
}

#[cfg_attr(test, mockall::automock)]
pub trait AttributeRepository: Send + Sync {
    fn find_all_by_id(&self, ids: &[i64]) -> Result<Vec<Attribute>>;
    fn find_all_by_key(&self, keys: &[String]) -> Result<Vec<Attribute>>;
    /// Creates one attribute per key in a single batch.
    fn save_all(&self, keys: &[String]) -> Result<Vec<Attribute>>;
}

#[cfg_attr(test, mockall::automock)]
pub trait OwnerAttributeRepository: Send + Sync {
    fn find_all_by_owner(&self, kind: OwnerKind, owner_id: i64) -> Result<Vec<OwnerAttribute>>;
    fn save_all(&self, kind: OwnerKind, records: &[OwnerAttribute]) -> Result<()>;
    fn delete_all_by_owner(&self, kind: OwnerKind, owner_id: i64) -> Result<()>;
    /// Deletes the join rows of the test cases in `scope` (`TestCase`) or of
    /// the manual scenarios of their versions (`ManualScenario`).
    fn delete_by_case_scope(&self, kind: OwnerKind, scope: &CaseScope) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait TestFolderRepository: Send + Sync {
    fn find_by_id(&self, id: i64) -> Result<Option<TestFolder>>;
    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<TestFolder>>;
    fn find_by_name_and_project_id(&self, name: &str, project_id: i64)
        -> Result<Option<TestFolder>>;
    fn find_all_by_project_id(&self, project_id: i64) -> Result<Vec<TestFolder>>;
    fn find_all_by_id(&self, ids: &[i64]) -> Result<Vec<TestFolder>>;
    /// Ids of `root_id` and every descendant, resolved by a recursive query.
    fn find_all_folder_ids_in_hierarchy(&self, project_id: i64, root_id: i64) -> Result<Vec<i64>>;
    fn insert(&self, folder: &TestFolder) -> Result<i64>;
    fn update(&self, folder: &TestFolder) -> Result<()>;
    fn delete_test_folder_with_subfolders_by_id(&self, project_id: i64, id: i64) -> Result<usize>;
}

#[cfg_attr(test, mockall::automock)]
pub trait TestCaseRepository: Send + Sync {
    fn find_by_id(&self, id: i64) -> Result<Option<TestCase>>;
    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<TestCase>>;
    fn find_all_by_folder_ids(&self, project_id: i64, folder_ids: &[i64]) -> Result<Vec<TestCase>>;
    fn insert(&self, test_case: &TestCase) -> Result<i64>;
    fn update(&self, test_case: &TestCase) -> Result<()>;
    fn delete_by_scope(&self, scope: &CaseScope) -> Result<usize>;
}

#[cfg_attr(test, mockall::automock)]
pub trait TestCaseVersionRepository: Send + Sync {
    fn find_default_by_test_case_id(&self, test_case_id: i64) -> Result<Option<TestCaseVersion>>;
    fn insert(&self, version: &TestCaseVersion) -> Result<i64>;
    fn update(&self, version: &TestCaseVersion) -> Result<()>;
    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ManualScenarioRepository: Send + Sync {
    fn find_by_version_id(&self, version_id: i64) -> Result<Option<ManualScenario>>;
    fn insert(&self, scenario: &ManualScenario) -> Result<i64>;
    fn update(&self, scenario: &ManualScenario) -> Result<()>;
    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait TextScenarioRepository: Send + Sync {
    fn find_by_scenario_id(&self, scenario_id: i64) -> Result<Option<TextScenario>>;
    /// Inserts or replaces the body of `scenario_id`.
    fn save(&self, scenario_id: i64, body: &TextScenario) -> Result<()>;
    fn delete_by_scenario_id(&self, scenario_id: i64) -> Result<()>;
    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait StepsScenarioRepository: Send + Sync {
    fn find_by_scenario_id(&self, scenario_id: i64) -> Result<Option<StepsScenario>>;
    /// Inserts or replaces the body of `scenario_id`, including all its steps.
    fn save(&self, scenario_id: i64, body: &StepsScenario) -> Result<()>;
    fn delete_by_scenario_id(&self, scenario_id: i64) -> Result<()>;
    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait TestPlanRepository: Send + Sync {
    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<TestPlan>>;
    fn insert(&self, plan: &TestPlan) -> Result<i64>;
    fn update(&self, plan: &TestPlan) -> Result<()>;
    fn delete_by_id(&self, id: i64) -> Result<usize>;
}

#[cfg_attr(test, mockall::automock)]
pub trait MilestoneRepository: Send + Sync {
    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<Milestone>>;
    fn find_all_by_id_and_project_id(&self, ids: &[i64], project_id: i64) -> Result<Vec<Milestone>>;
    fn find_all_by_test_plan_id(&self, test_plan_id: i64) -> Result<Vec<Milestone>>;
    fn insert(&self, milestone: &Milestone) -> Result<i64>;
    fn attach_test_plan_to_milestone(&self, milestone_id: i64, test_plan_id: i64) -> Result<()>;
    fn detach_test_plan_from_milestones(&self, test_plan_id: i64) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait DatasetRepository: Send + Sync {
    fn find_by_id_and_project_id(&self, id: i64, project_id: i64) -> Result<Option<Dataset>>;
    fn insert(&self, dataset: &Dataset) -> Result<i64>;
    fn update(&self, dataset: &Dataset) -> Result<()>;
    fn delete_by_id(&self, id: i64) -> Result<usize>;

    fn insert_environment(&self, environment: &Environment) -> Result<i64>;
    fn find_environments_by_id_and_project_id(
        &self,
        ids: &[i64],
        project_id: i64,
    ) -> Result<Vec<Environment>>;

    fn find_links_by_dataset_id(&self, dataset_id: i64) -> Result<Vec<EnvironmentDataset>>;
    fn save_links(&self, links: &[EnvironmentDataset]) -> Result<()>;
    fn delete_links_by_dataset_id(&self, dataset_id: i64) -> Result<()>;
}
