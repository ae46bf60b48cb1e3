use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::info;

use super::attribute::{create_collection, patch_collection, replace_collection, CollectionBinding};
use crate::error::{join_ids, Result, TmsError};
use crate::models::{Dataset, DatasetInput, Environment, EnvironmentDataset, EnvironmentInput};
use crate::repository::DatasetRepository;

/// Binds a dataset's environment links to the merge functions.
struct EnvironmentLinks<'a> {
    repo: &'a dyn DatasetRepository,
}

impl CollectionBinding for EnvironmentLinks<'_> {
    type Owner = Dataset;
    type Record = EnvironmentDataset;
    type Input = i64;

    fn owner_id(&self, owner: &Dataset) -> i64 {
        owner.id
    }

    fn records_mut<'o>(&self, owner: &'o mut Dataset) -> &'o mut Vec<EnvironmentDataset> {
        &mut owner.environments
    }

    fn build(&self, owner: &Dataset, environment_ids: &[i64]) -> Result<Vec<EnvironmentDataset>> {
        let requested: Vec<i64> = environment_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let found: HashSet<i64> = self
            .repo
            .find_environments_by_id_and_project_id(&requested, owner.project_id)?
            .into_iter()
            .map(|e| e.id)
            .collect();
        let missing: Vec<i64> = requested
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(TmsError::not_found(format!(
                "Environments with ids [{}] not found in project {}",
                join_ids(&missing),
                owner.project_id
            )));
        }

        let linked: HashSet<i64> = owner.environments.iter().map(|l| l.environment_id).collect();
        Ok(requested
            .into_iter()
            .filter(|id| !linked.contains(id))
            .map(|environment_id| EnvironmentDataset {
                dataset_id: owner.id,
                environment_id,
            })
            .collect())
    }

    fn save_all(&self, records: &[EnvironmentDataset]) -> Result<()> {
        self.repo.save_links(records)
    }

    fn delete_all_by_owner(&self, owner_id: i64) -> Result<()> {
        self.repo.delete_links_by_dataset_id(owner_id)
    }
}

/// Datasets, their environment bindings, and environments.
pub struct DatasetService {
    repo: Arc<dyn DatasetRepository>,
}

impl DatasetService {
    pub fn new(repo: Arc<dyn DatasetRepository>) -> Self {
        Self { repo }
    }

    fn links(&self) -> EnvironmentLinks<'_> {
        EnvironmentLinks {
            repo: self.repo.as_ref(),
        }
    }

    pub fn create_environment(&self, project_id: i64, input: &EnvironmentInput) -> Result<Environment> {
        if input.name.trim().is_empty() {
            return Err(TmsError::validation("name must not be blank"));
        }
        let mut environment = Environment {
            id: 0,
            project_id,
            name: input.name.clone(),
        };
        environment.id = self.repo.insert_environment(&environment)?;
        info!(environment_id = environment.id, project_id, "Created environment");
        Ok(environment)
    }

    pub fn create(&self, project_id: i64, input: &DatasetInput) -> Result<Dataset> {
        let mut dataset = Dataset::from_input(project_id, input)?;
        dataset.id = self.repo.insert(&dataset)?;
        create_collection(&self.links(), &mut dataset, &input.environment_ids)?;

        info!(dataset_id = dataset.id, project_id, rows = dataset.rows.len(), "Created dataset");
        Ok(dataset)
    }

    pub fn get_by_id(&self, project_id: i64, id: i64) -> Result<Dataset> {
        let mut dataset = self.find_in_project(project_id, id)?;
        dataset.environments = self.repo.find_links_by_dataset_id(id)?;
        Ok(dataset)
    }

    /// Full update: rows and environment links are replaced.
    pub fn update(&self, project_id: i64, id: i64, input: &DatasetInput) -> Result<Dataset> {
        let mut dataset = self.find_in_project(project_id, id)?;
        dataset.update_from(input)?;
        self.repo.update(&dataset)?;
        replace_collection(&self.links(), &mut dataset, &input.environment_ids)?;

        info!(dataset_id = id, project_id, "Updated dataset");
        Ok(dataset)
    }

    /// Partial update: new environment links are added to the existing ones.
    pub fn patch(&self, project_id: i64, id: i64, input: &DatasetInput) -> Result<Dataset> {
        let mut dataset = self.get_by_id(project_id, id)?;
        dataset.patch_from(input);
        self.repo.update(&dataset)?;
        patch_collection(&self.links(), &mut dataset, &input.environment_ids)?;

        info!(dataset_id = id, project_id, "Patched dataset");
        Ok(dataset)
    }

    /// Deletes a dataset and its environment links. A missing dataset is a no-op.
    pub fn delete(&self, project_id: i64, id: i64) -> Result<()> {
        if self.repo.find_by_id_and_project_id(id, project_id)?.is_none() {
            return Ok(());
        }
        self.repo.delete_links_by_dataset_id(id)?;
        self.repo.delete_by_id(id)?;
        info!(dataset_id = id, project_id, "Deleted dataset");
        Ok(())
    }

    fn find_in_project(&self, project_id: i64, id: i64) -> Result<Dataset> {
        self.repo.find_by_id_and_project_id(id, project_id)?.ok_or_else(|| {
            TmsError::not_found(format!(
                "Dataset with id {} not found in project {}",
                id, project_id
            ))
        })
    }
}
