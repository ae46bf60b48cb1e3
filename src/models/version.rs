use serde::{Deserialize, Serialize};

use super::scenario::{ManualScenario, ManualScenarioInput};

/// A version of a test case. At most one version per test case is the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseVersion {
    pub id: i64,
    pub test_case_id: i64,
    pub name: Option<String>,
    pub is_default: bool,
    pub manual_scenario: Option<ManualScenario>,
}

/// Input for the default version of a test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseVersionInput {
    pub name: Option<String>,
    pub manual_scenario: Option<ManualScenarioInput>,
}

impl TestCaseVersion {
    pub fn new_default(test_case_id: i64, input: &TestCaseVersionInput) -> Self {
        Self {
            id: 0,
            test_case_id,
            name: input.name.clone(),
            is_default: true,
            manual_scenario: None,
        }
    }

    pub fn update_from(&mut self, input: &TestCaseVersionInput) {
        self.name = input.name.clone();
    }

    pub fn patch_from(&mut self, input: &TestCaseVersionInput) {
        if input.name.is_some() {
            self.name = input.name.clone();
        }
    }
}
