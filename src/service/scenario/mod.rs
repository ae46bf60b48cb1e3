//! Manual scenarios: the shared row, its attributes, and a per-type body
//! handled by a [`ScenarioVariantService`].

mod steps;
mod text;
mod variant;

pub use steps::StepsVariantService;
pub use text::TextVariantService;
pub use variant::{ScenarioVariantService, VariantRegistry};

use std::sync::Arc;

use tracing::{debug, info};

use super::attribute::AttributeService;
use crate::error::{Result, TmsError};
use crate::models::{ManualScenario, ManualScenarioInput, OwnerKind, TestCaseVersion};
use crate::repository::{CaseScope, ManualScenarioRepository};

pub struct ManualScenarioService {
    repo: Arc<dyn ManualScenarioRepository>,
    attributes: Arc<AttributeService>,
    variants: Arc<VariantRegistry>,
}

impl ManualScenarioService {
    pub fn new(
        repo: Arc<dyn ManualScenarioRepository>,
        attributes: Arc<AttributeService>,
        variants: Arc<VariantRegistry>,
    ) -> Self {
        Self {
            repo,
            attributes,
            variants,
        }
    }

    /// Creates the scenario of `version` and wires it onto the version.
    pub fn create(&self, version: &mut TestCaseVersion, input: &ManualScenarioInput) -> Result<()> {
        let variant = self.variants.get(input.scenario_type())?;

        let mut scenario = ManualScenario::from_input(version.id, input);
        scenario.id = self.repo.insert(&scenario)?;
        self.attributes.create(&mut scenario, &input.attributes)?;
        variant.create_variant(&mut scenario, &input.body)?;

        debug!(
            scenario_id = scenario.id,
            version_id = version.id,
            scenario_type = scenario.scenario_type.as_str(),
            "Created manual scenario"
        );
        version.manual_scenario = Some(scenario);
        Ok(())
    }

    /// Full update of the version's scenario. Creates it when missing.
    ///
    /// Switching the scenario type deletes the previous body first.
    pub fn update(&self, version: &mut TestCaseVersion, input: &ManualScenarioInput) -> Result<()> {
        let variant = self.variants.get(input.scenario_type())?;

        let Some(mut scenario) = self.repo.find_by_version_id(version.id)? else {
            return self.create(version, input);
        };

        let previous_type = scenario.scenario_type;
        scenario.update_from(input);
        self.repo.update(&scenario)?;
        self.attributes.replace(&mut scenario, &input.attributes)?;

        if previous_type != scenario.scenario_type {
            info!(
                scenario_id = scenario.id,
                from = previous_type.as_str(),
                to = scenario.scenario_type.as_str(),
                "Switching manual scenario type"
            );
            self.variants.get(previous_type)?.delete_variant(scenario.id)?;
        }
        variant.update_variant(&mut scenario, &input.body)?;

        version.manual_scenario = Some(scenario);
        Ok(())
    }

    /// Copies the fields present in `input` onto the existing scenario. The
    /// scenario type cannot change on patch.
    pub fn patch(&self, version: &mut TestCaseVersion, input: &ManualScenarioInput) -> Result<()> {
        let mut scenario = self.repo.find_by_version_id(version.id)?.ok_or_else(|| {
            TmsError::not_found(format!(
                "Manual Scenario for the test case version with id {} not found",
                version.id
            ))
        })?;
        if input.scenario_type() != scenario.scenario_type {
            return Err(TmsError::validation(format!(
                "Manual Scenario {} has type {}, cannot patch it as {}",
                scenario.id,
                scenario.scenario_type.as_str(),
                input.scenario_type().as_str()
            )));
        }
        let variant = self.variants.get(input.scenario_type())?;

        scenario.attributes = self
            .attributes
            .find_all(OwnerKind::ManualScenario, scenario.id)?;
        scenario.patch_from(input);
        self.repo.update(&scenario)?;
        self.attributes.patch(&mut scenario, &input.attributes)?;
        variant.patch_variant(&mut scenario, &input.body)?;

        version.manual_scenario = Some(scenario);
        Ok(())
    }

    /// Loads the scenario of a version with its attributes and body.
    pub fn find_by_version(&self, version_id: i64) -> Result<Option<ManualScenario>> {
        let Some(mut scenario) = self.repo.find_by_version_id(version_id)? else {
            return Ok(None);
        };
        scenario.attributes = self
            .attributes
            .find_all(OwnerKind::ManualScenario, scenario.id)?;
        self.variants
            .get(scenario.scenario_type)?
            .load_variant(&mut scenario)?;
        Ok(Some(scenario))
    }

    /// Deletes bodies of every type, then attributes, then the scenario rows.
    pub fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        for variant in self.variants.all() {
            variant.delete_by_scope(scope)?;
        }
        self.attributes
            .delete_by_case_scope(OwnerKind::ManualScenario, scope)?;
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
