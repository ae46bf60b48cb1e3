use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::attribute::AttributeService;
use crate::error::{join_ids, Result, TmsError};
use crate::models::{Milestone, MilestoneInput, OwnerKind, TestPlan, TestPlanInput};
use crate::repository::{MilestoneRepository, TestPlanRepository};

/// Milestones and their join to test plans.
pub struct MilestoneService {
    repo: Arc<dyn MilestoneRepository>,
}

impl MilestoneService {
    pub fn new(repo: Arc<dyn MilestoneRepository>) -> Self {
        Self { repo }
    }

    pub fn create(&self, project_id: i64, input: &MilestoneInput) -> Result<Milestone> {
        if input.name.trim().is_empty() {
            return Err(TmsError::validation("name must not be blank"));
        }
        let mut milestone = Milestone {
            id: 0,
            project_id,
            name: input.name.clone(),
            created_at: Utc::now(),
        };
        milestone.id = self.repo.insert(&milestone)?;
        info!(milestone_id = milestone.id, project_id, "Created milestone");
        Ok(milestone)
    }

    pub fn get_by_id(&self, project_id: i64, id: i64) -> Result<Milestone> {
        self.repo.find_by_id_and_project_id(id, project_id)?.ok_or_else(|| {
            TmsError::not_found(format!(
                "Milestone with id {} not found in project {}",
                id, project_id
            ))
        })
    }

    pub fn find_by_test_plan(&self, test_plan_id: i64) -> Result<Vec<Milestone>> {
        self.repo.find_all_by_test_plan_id(test_plan_id)
    }

    pub fn attach_test_plan_to_milestone(&self, milestone_id: i64, test_plan_id: i64) -> Result<()> {
        self.repo.attach_test_plan_to_milestone(milestone_id, test_plan_id)
    }

    pub fn detach_test_plan_from_milestones(&self, test_plan_id: i64) -> Result<()> {
        self.repo.detach_test_plan_from_milestones(test_plan_id)
    }

    /// Attaches `plan` to every milestone in `ids`, skipping ones it already has.
    pub fn attach_all(&self, plan: &mut TestPlan, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let attached: HashSet<i64> = plan.milestones.iter().map(|m| m.id).collect();
        for milestone in self.resolve(plan.project_id, ids)? {
            if attached.contains(&milestone.id) {
                continue;
            }
            self.attach_test_plan_to_milestone(milestone.id, plan.id)?;
            plan.milestones.push(milestone);
        }
        Ok(())
    }

    /// Detaches `plan` from all milestones, then attaches it to `ids`.
    pub fn replace_all(&self, plan: &mut TestPlan, ids: &[i64]) -> Result<()> {
        self.detach_test_plan_from_milestones(plan.id)?;
        plan.milestones.clear();
        self.attach_all(plan, ids)
    }

    fn resolve(&self, project_id: i64, ids: &[i64]) -> Result<Vec<Milestone>> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let found = self.repo.find_all_by_id_and_project_id(&unique, project_id)?;
        let found_ids: HashSet<i64> = found.iter().map(|m| m.id).collect();
        let missing: Vec<i64> = unique
            .into_iter()
            .filter(|id| !found_ids.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(TmsError::not_found(format!(
                "Milestones with ids [{}] not found in project {}",
                join_ids(&missing),
                project_id
            )));
        }
        Ok(found)
    }
}

pub struct TestPlanService {
    repo: Arc<dyn TestPlanRepository>,
    attributes: Arc<AttributeService>,
    milestones: Arc<MilestoneService>,
}

impl TestPlanService {
    pub fn new(
        repo: Arc<dyn TestPlanRepository>,
        attributes: Arc<AttributeService>,
        milestones: Arc<MilestoneService>,
    ) -> Self {
        Self {
            repo,
            attributes,
            milestones,
        }
    }

    pub fn create(&self, project_id: i64, input: &TestPlanInput) -> Result<TestPlan> {
        let mut plan = TestPlan::from_input(project_id, input)?;
        plan.id = self.repo.insert(&plan)?;
        self.attributes.create(&mut plan, &input.attributes)?;
        self.milestones.attach_all(&mut plan, &input.milestone_ids)?;

        info!(test_plan_id = plan.id, project_id, "Created test plan");
        Ok(plan)
    }

    pub fn get_by_id(&self, project_id: i64, id: i64) -> Result<TestPlan> {
        let mut plan = self.find_in_project(project_id, id)?;
        self.hydrate(&mut plan)?;
        Ok(plan)
    }

    /// Full update: attributes and milestones are replaced.
    pub fn update(&self, project_id: i64, id: i64, input: &TestPlanInput) -> Result<TestPlan> {
        let mut plan = self.find_in_project(project_id, id)?;
        plan.update_from(input)?;
        self.repo.update(&plan)?;
        self.attributes.replace(&mut plan, &input.attributes)?;
        self.milestones.replace_all(&mut plan, &input.milestone_ids)?;

        info!(test_plan_id = id, project_id, "Updated test plan");
        Ok(plan)
    }

    /// Partial update: attributes and milestones in `input` are added.
    pub fn patch(&self, project_id: i64, id: i64, input: &TestPlanInput) -> Result<TestPlan> {
        let mut plan = self.find_in_project(project_id, id)?;
        self.hydrate(&mut plan)?;
        plan.patch_from(input);
        self.repo.update(&plan)?;
        self.attributes.patch(&mut plan, &input.attributes)?;
        self.milestones.attach_all(&mut plan, &input.milestone_ids)?;

        info!(test_plan_id = id, project_id, "Patched test plan");
        Ok(plan)
    }

    /// Deletes a test plan with its attributes and milestone links. A missing
    /// plan is a no-op.
    pub fn delete(&self, project_id: i64, id: i64) -> Result<()> {
        if self.repo.find_by_id_and_project_id(id, project_id)?.is_none() {
            return Ok(());
        }
        self.milestones.detach_test_plan_from_milestones(id)?;
        self.attributes.delete_all(OwnerKind::TestPlan, id)?;
        self.repo.delete_by_id(id)?;

        info!(test_plan_id = id, project_id, "Deleted test plan");
        Ok(())
    }

    fn hydrate(&self, plan: &mut TestPlan) -> Result<()> {
        plan.attributes = self.attributes.find_all(OwnerKind::TestPlan, plan.id)?;
        plan.milestones = self.milestones.find_by_test_plan(plan.id)?;
        Ok(())
    }

    fn find_in_project(&self, project_id: i64, id: i64) -> Result<TestPlan> {
        self.repo.find_by_id_and_project_id(id, project_id)?.ok_or_else(|| {
            TmsError::not_found(format!(
                "Test plan with id {} not found in project {}",
                id, project_id
            ))
        })
    }
}
