use std::sync::Arc;

use tracing::debug;

use super::variant::{mismatched_body, ScenarioVariantService};
use crate::error::{Result, TmsError};
use crate::models::{
    ManualScenario, ScenarioBodyInput, ScenarioType, ScenarioVariant, TextScenario,
    TextScenarioInput,
};
use crate::repository::{CaseScope, TextScenarioRepository};

/// Free-form instructions with one expected result.
pub struct TextVariantService {
    repo: Arc<dyn TextScenarioRepository>,
}

impl TextVariantService {
    pub fn new(repo: Arc<dyn TextScenarioRepository>) -> Self {
        Self { repo }
    }

    fn body<'a>(&self, input: &'a ScenarioBodyInput) -> Result<&'a TextScenarioInput> {
        match input {
            ScenarioBodyInput::Text(body) => Ok(body),
            other => Err(mismatched_body(ScenarioType::Text, other)),
        }
    }

    fn store(&self, scenario: &mut ManualScenario, body: TextScenario) -> Result<()> {
        self.repo.save(scenario.id, &body)?;
        scenario.variant = Some(ScenarioVariant::Text(body));
        Ok(())
    }
}

impl ScenarioVariantService for TextVariantService {
    fn scenario_type(&self) -> ScenarioType {
        ScenarioType::Text
    }

    fn create_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()> {
        let input = self.body(input)?;
        self.store(
            scenario,
            TextScenario {
                instructions: input.instructions.clone(),
                expected_result: input.expected_result.clone(),
            },
        )
    }

    fn update_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()> {
        let body = self.body(input)?;
        match self.repo.find_by_scenario_id(scenario.id)? {
            Some(mut existing) => {
                existing.instructions = body.instructions.clone();
                existing.expected_result = body.expected_result.clone();
                self.store(scenario, existing)
            }
            None => {
                debug!(scenario_id = scenario.id, "No text body to update, creating one");
                self.create_variant(scenario, input)
            }
        }
    }

    fn patch_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()> {
        let body = self.body(input)?;
        let mut existing = self.repo.find_by_scenario_id(scenario.id)?.ok_or_else(|| {
            TmsError::not_found(format!(
                "Text scenario for the manual scenario with id {} not found",
                scenario.id
            ))
        })?;

        if body.instructions.is_some() {
            existing.instructions = body.instructions.clone();
        }
        if body.expected_result.is_some() {
            existing.expected_result = body.expected_result.clone();
        }
        self.store(scenario, existing)
    }

    fn load_variant(&self, scenario: &mut ManualScenario) -> Result<()> {
        scenario.variant = self
            .repo
            .find_by_scenario_id(scenario.id)?
            .map(ScenarioVariant::Text);
        Ok(())
    }

    fn delete_variant(&self, scenario_id: i64) -> Result<()> {
        self.repo.delete_by_scenario_id(scenario_id)
    }

    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        self.repo.delete_by_scope(scope)
    }
}
