use std::sync::Arc;

use tracing::debug;

use super::variant::{mismatched_body, ScenarioVariantService};
use crate::error::{Result, TmsError};
use crate::models::{
    ManualScenario, ScenarioBodyInput, ScenarioType, ScenarioVariant, StepsScenario,
    StepsScenarioInput,
};
use crate::repository::{CaseScope, StepsScenarioRepository};

/// An ordered list of steps, each with its own expected result and attachments.
pub struct StepsVariantService {
    repo: Arc<dyn StepsScenarioRepository>,
}

impl StepsVariantService {
    pub fn new(repo: Arc<dyn StepsScenarioRepository>) -> Self {
        Self { repo }
    }

    fn body<'a>(&self, input: &'a ScenarioBodyInput) -> Result<&'a StepsScenarioInput> {
        match input {
            ScenarioBodyInput::Steps(body) => Ok(body),
            other => Err(mismatched_body(ScenarioType::Steps, other)),
        }
    }

    fn store(&self, scenario: &mut ManualScenario, body: StepsScenario) -> Result<()> {
        self.repo.save(scenario.id, &body)?;
        scenario.variant = Some(ScenarioVariant::Steps(body));
        Ok(())
    }
}

impl ScenarioVariantService for StepsVariantService {
    fn scenario_type(&self) -> ScenarioType {
        ScenarioType::Steps
    }

    fn create_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()> {
        let input = self.body(input)?;
        self.store(
            scenario,
            StepsScenario {
                steps: input.steps.clone().unwrap_or_default(),
            },
        )
    }

    fn update_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()> {
        let body = self.body(input)?;
        match self.repo.find_by_scenario_id(scenario.id)? {
            Some(mut existing) => {
                existing.steps = body.steps.clone().unwrap_or_default();
                self.store(scenario, existing)
            }
            None => {
                debug!(scenario_id = scenario.id, "No steps body to update, creating one");
                self.create_variant(scenario, input)
            }
        }
    }

    fn patch_variant(&self, scenario: &mut ManualScenario, input: &ScenarioBodyInput) -> Result<()> {
        let body = self.body(input)?;
        let mut existing = self.repo.find_by_scenario_id(scenario.id)?.ok_or_else(|| {
            TmsError::not_found(format!(
                "Steps scenario for the manual scenario with id {} not found",
                scenario.id
            ))
        })?;

        if let Some(steps) = &body.steps {
            existing.steps = steps.clone();
        }
        self.store(scenario, existing)
    }

    fn load_variant(&self, scenario: &mut ManualScenario) -> Result<()> {
        scenario.variant = self
            .repo
            .find_by_scenario_id(scenario.id)?
            .map(ScenarioVariant::Steps);
        Ok(())
    }

    fn delete_variant(&self, scenario_id: i64) -> Result<()> {
        self.repo.delete_by_scenario_id(scenario_id)
    }

    fn delete_by_scope(&self, scope: &CaseScope) -> Result<()> {
        self.repo.delete_by_scope(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;
    use crate::repository::MockStepsScenarioRepository;

    fn scenario(id: i64) -> ManualScenario {
        ManualScenario {
            id,
            test_case_version_id: 1,
            scenario_type: ScenarioType::Steps,
            execution_estimation_time: None,
            link_to_requirements: None,
            preconditions: None,
            attributes: Vec::new(),
            variant: None,
        }
    }

    fn step(instructions: &str) -> Step {
        Step {
            instructions: Some(instructions.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_keeps_step_order() {
        let mut repo = MockStepsScenarioRepository::new();
        repo.expect_save()
            .withf(|_, body| {
                let names: Vec<_> = body
                    .steps
                    .iter()
                    .filter_map(|s| s.instructions.as_deref())
                    .collect();
                names == ["first", "second", "third"]
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let service = StepsVariantService::new(Arc::new(repo));
        let mut scenario = scenario(3);

        service
            .create_variant(
                &mut scenario,
                &ScenarioBodyInput::Steps(StepsScenarioInput {
                    steps: Some(vec![step("first"), step("second"), step("third")]),
                }),
            )
            .unwrap();

        match scenario.variant {
            Some(ScenarioVariant::Steps(body)) => assert_eq!(body.steps.len(), 3),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_patch_without_steps_keeps_existing() {
        let mut repo = MockStepsScenarioRepository::new();
        repo.expect_find_by_scenario_id().returning(|_| {
            Ok(Some(StepsScenario {
                steps: vec![step("kept")],
            }))
        });
        repo.expect_save()
            .withf(|_, body| body.steps.len() == 1)
            .times(1)
            .returning(|_, _| Ok(()));
        let service = StepsVariantService::new(Arc::new(repo));

        service
            .patch_variant(
                &mut scenario(3),
                &ScenarioBodyInput::Steps(StepsScenarioInput { steps: None }),
            )
            .unwrap();
    }

    #[test]
    fn test_update_without_body_creates_one() {
        let mut repo = MockStepsScenarioRepository::new();
        repo.expect_find_by_scenario_id().returning(|_| Ok(None));
        repo.expect_save().times(1).returning(|_, _| Ok(()));
        let service = StepsVariantService::new(Arc::new(repo));
        let mut scenario = scenario(3);

        service
            .update_variant(
                &mut scenario,
                &ScenarioBodyInput::Steps(StepsScenarioInput {
                    steps: Some(vec![step("only")]),
                }),
            )
            .unwrap();

        assert!(scenario.variant.is_some());
    }
}
