//! Business services over the repository traits.
//!
//! [`Tms`] wires every service to one [`Database`]. Services never open their
//! own transaction; callers wrap multi-step work in [`Tms::transaction`].

pub mod attribute;
pub mod dataset;
pub mod folder;
pub mod scenario;
pub mod test_case;
pub mod test_plan;
pub mod version;

pub use attribute::{AttributeResolver, AttributeService, CollectionBinding};
pub use dataset::DatasetService;
pub use folder::TestFolderHierarchyService;
pub use scenario::{ManualScenarioService, ScenarioVariantService, VariantRegistry};
pub use test_case::TestCaseService;
pub use test_plan::{MilestoneService, TestPlanService};
pub use version::TestCaseVersionService;

use std::sync::Arc;

use crate::db::Database;
use crate::error::TmsError;
use crate::export::FileType;
use crate::models::TestFolderNode;

#[derive(Clone)]
pub struct Tms {
    db: Database,
    pub attributes: Arc<AttributeService>,
    pub scenarios: Arc<ManualScenarioService>,
    pub versions: Arc<TestCaseVersionService>,
    pub test_cases: Arc<TestCaseService>,
    pub folders: Arc<TestFolderHierarchyService>,
    pub milestones: Arc<MilestoneService>,
    pub test_plans: Arc<TestPlanService>,
    pub datasets: Arc<DatasetService>,
}

impl Tms {
    pub fn new(db: Database) -> Self {
        let store = Arc::new(db.clone());

        let attributes = Arc::new(AttributeService::new(store.clone(), store.clone()));
        let variants = Arc::new(VariantRegistry::with_defaults(store.clone(), store.clone()));
        let scenarios = Arc::new(ManualScenarioService::new(
            store.clone(),
            attributes.clone(),
            variants,
        ));
        let versions = Arc::new(TestCaseVersionService::new(store.clone(), scenarios.clone()));
        let test_cases = Arc::new(TestCaseService::new(
            store.clone(),
            store.clone(),
            attributes.clone(),
            versions.clone(),
        ));
        let folders = Arc::new(TestFolderHierarchyService::new(
            store.clone(),
            test_cases.clone(),
        ));
        let milestones = Arc::new(MilestoneService::new(store.clone()));
        let test_plans = Arc::new(TestPlanService::new(
            store.clone(),
            attributes.clone(),
            milestones.clone(),
        ));
        let datasets = Arc::new(DatasetService::new(store));

        Self {
            db,
            attributes,
            scenarios,
            versions,
            test_cases,
            folders,
            milestones,
            test_plans,
            datasets,
        }
    }

    /// Runs `f` atomically. Any error rolls back every write made inside it.
    pub fn transaction<T>(&self, f: impl FnOnce() -> Result<T, TmsError>) -> Result<T, TmsError> {
        self.db.transaction(f)
    }

    /// Reads the hierarchy below `root_id` in one transaction.
    pub fn folder_tree(&self, project_id: i64, root_id: i64) -> Result<TestFolderNode, TmsError> {
        self.transaction(|| self.folders.find_folder_with_full_hierarchy(project_id, root_id))
    }

    /// Exports the hierarchy below `root_id` into memory. Nothing is returned
    /// unless the whole export succeeds.
    pub fn export(&self, project_id: i64, root_id: i64, file_type: FileType) -> Result<Vec<u8>, TmsError> {
        let mut buf = Vec::new();
        self.transaction(|| self.folders.export(project_id, root_id, file_type, &mut buf))?;
        Ok(buf)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
