use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::steps::StepsVariantService;
use super::text::TextVariantService;
use crate::error::{Result, TmsError};
use crate::models::{ManualScenario, ScenarioBodyInput, ScenarioType};
use crate::repository::{CaseScope, StepsScenarioRepository, TextScenarioRepository};

/// Per-variant handling of a manual scenario's body.
///
/// Every operation receives a scenario whose shared row is already stored,
/// so `scenario.id` is valid.
pub trait ScenarioVariantService: Send + Sync {
    fn scenario_type(&self) -> ScenarioType;

    fn create_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()>;

    /// Replaces the stored body, creating it when none exists.
    fn update_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()>;

    /// Copies only the fields present in `input` onto the stored body.
    fn patch_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()>;

    fn load_variant(&self, scenario: &mut ManualScenario) -> Result<()>;

    fn delete_variant(&self, scenario_id: i64) -> Result<()>;

    /// Deletes the bodies of the scenarios belonging to the test cases in `scope`.
    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()>;

    fn delete_by_test_case_id(&self, test_case_id: i64) -> Result<()> {
        self.delete_by_scope(&CaseScope::TestCase(test_case_id))
    }

    fn delete_by_test_case_ids(&self, test_case_ids: &[i64]) -> Result<()> {
        self.delete_by_scope(&CaseScope::TestCases(test_case_ids.to_vec()))
    }

    fn delete_by_folder_id(&self, project_id: i64, folder_id: i64) -> Result<()> {
        self.delete_by_scope(&CaseScope::Folder {
            project_id,
            folder_id,
        })
    }
}

pub(super) fn mismatched_body(expected: ScenarioType, input: &ScenarioBodyInput) -> TmsError {
    TmsError::validation(format!(
        "{} scenario body given to the {} handler",
        input.scenario_type().as_str(),
        expected.as_str()
    ))
}

/// Maps each scenario type to the service that owns its body.
///
/// Iteration order is fixed by [`ScenarioType`]'s ordering, so fan-out
/// deletes always run in the same order.
#[derive(Default)]
pub struct VariantRegistry {
    services: BTreeMap<ScenarioType, Arc<dyn ScenarioVariantService>>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the TEXT and STEPS services.
    pub fn with_defaults(
        text: Arc<dyn TextScenarioRepository>,
        steps: Arc<dyn StepsScenarioRepository>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextVariantService::new(text)));
        registry.register(Arc::new(StepsVariantService::new(steps)));
        registry
    }

    pub fn register(&mut self, service: Arc<dyn ScenarioVariantService>) {
        let scenario_type = service.scenario_type();
        debug!(scenario_type = scenario_type.as_str(), "Registering scenario variant service");
        self.services.insert(scenario_type, service);
    }

    pub fn get(&self, scenario_type: ScenarioType) -> Result<Arc<dyn ScenarioVariantService>> {
        self.services.get(&scenario_type).cloned().ok_or_else(|| {
            TmsError::validation(format!(
                "no handler registered for scenario type {}",
                scenario_type.as_str()
            ))
        })
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn ScenarioVariantService>> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
