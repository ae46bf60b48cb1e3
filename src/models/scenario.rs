use serde::{Deserialize, Serialize};

use super::attribute::{AttributeInput, AttributeOwner, OwnerAttribute, OwnerKind};

/// The shape of a manual scenario's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioType {
    Text,
    Steps,
}

impl ScenarioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Steps => "STEPS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(Self::Text),
            "STEPS" => Some(Self::Steps),
            _ => None,
        }
    }
}

/// The body of a test case version describing how to execute it by hand.
///
/// Owned 1:1 by its version through `test_case_version_id`. The shared fields
/// live here; the body lives in `variant`, whose shape matches `scenario_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualScenario {
    pub id: i64,
    pub test_case_version_id: i64,
    pub scenario_type: ScenarioType,
    /// Estimated execution time in seconds.
    pub execution_estimation_time: Option<i32>,
    pub link_to_requirements: Option<String>,
    pub preconditions: Option<String>,
    pub attributes: Vec<OwnerAttribute>,
    pub variant: Option<ScenarioVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioVariant {
    Text(TextScenario),
    Steps(StepsScenario),
}

impl ScenarioVariant {
    pub fn scenario_type(&self) -> ScenarioType {
        match self {
            Self::Text(_) => ScenarioType::Text,
            Self::Steps(_) => ScenarioType::Steps,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextScenario {
    pub instructions: Option<String>,
    pub expected_result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsScenario {
    pub steps: Vec<Step>,
}

/// One step of a STEPS scenario. Order is the position in [`StepsScenario::steps`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub instructions: Option<String>,
    pub expected_result: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A reference to a file held by the platform's file storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub file_id: Option<String>,
}

/// Input for creating, updating or patching a manual scenario.
///
/// The `type` discriminator selects the body shape and the variant service
/// that handles it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualScenarioInput {
    pub execution_estimation_time: Option<i32>,
    pub link_to_requirements: Option<String>,
    pub preconditions: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeInput>,
    #[serde(flatten)]
    pub body: ScenarioBodyInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioBodyInput {
    Text(TextScenarioInput),
    Steps(StepsScenarioInput),
}

impl ScenarioBodyInput {
    pub fn scenario_type(&self) -> ScenarioType {
        match self {
            Self::Text(_) => ScenarioType::Text,
            Self::Steps(_) => ScenarioType::Steps,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextScenarioInput {
    pub instructions: Option<String>,
    pub expected_result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsScenarioInput {
    pub steps: Option<Vec<Step>>,
}

impl ManualScenarioInput {
    pub fn text(instructions: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self::with_body(ScenarioBodyInput::Text(TextScenarioInput {
            instructions: Some(instructions.into()),
            expected_result: Some(expected_result.into()),
        }))
    }

    pub fn steps(steps: Vec<Step>) -> Self {
        Self::with_body(ScenarioBodyInput::Steps(StepsScenarioInput { steps: Some(steps) }))
    }

    fn with_body(body: ScenarioBodyInput) -> Self {
        Self {
            execution_estimation_time: None,
            link_to_requirements: None,
            preconditions: None,
            attributes: Vec::new(),
            body,
        }
    }

    pub fn scenario_type(&self) -> ScenarioType {
        self.body.scenario_type()
    }
}

impl ManualScenario {
    pub fn from_input(test_case_version_id: i64, input: &ManualScenarioInput) -> Self {
        Self {
            id: 0,
            test_case_version_id,
            scenario_type: input.scenario_type(),
            execution_estimation_time: input.execution_estimation_time,
            link_to_requirements: input.link_to_requirements.clone(),
            preconditions: input.preconditions.clone(),
            attributes: Vec::new(),
            variant: None,
        }
    }

    pub fn update_from(&mut self, input: &ManualScenarioInput) {
        self.scenario_type = input.scenario_type();
        self.execution_estimation_time = input.execution_estimation_time;
        self.link_to_requirements = input.link_to_requirements.clone();
        self.preconditions = input.preconditions.clone();
    }

    pub fn patch_from(&mut self, input: &ManualScenarioInput) {
        if input.execution_estimation_time.is_some() {
            self.execution_estimation_time = input.execution_estimation_time;
        }
        if input.link_to_requirements.is_some() {
            self.link_to_requirements = input.link_to_requirements.clone();
        }
        if input.preconditions.is_some() {
            self.preconditions = input.preconditions.clone();
        }
    }
}

impl AttributeOwner for ManualScenario {
    const KIND: OwnerKind = OwnerKind::ManualScenario;

    fn owner_id(&self) -> i64 {
        self.id
    }

    fn attributes(&self) -> &[OwnerAttribute] {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Vec<OwnerAttribute> {
        &mut self.attributes
    }
}
