use serde::{Deserialize, Serialize};

/// A reusable named tag, globally unique by `key`.
///
/// Attributes are shared: many owners (test cases, manual scenarios, test plans)
/// reference the same row through [`OwnerAttribute`] join records. No owner
/// deletes an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub id: i64,
    pub key: String,
}

/// The kind of entity an [`OwnerAttribute`] is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    TestCase,
    ManualScenario,
    TestPlan,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TestCase => "test_case",
            Self::ManualScenario => "manual_scenario",
            Self::TestPlan => "test_plan",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "test_case" => Some(Self::TestCase),
            "manual_scenario" => Some(Self::ManualScenario),
            "test_plan" => Some(Self::TestPlan),
            _ => None,
        }
    }
}

/// Join record attaching an [`Attribute`] with a value to an owner.
///
/// `key` is denormalized from the attribute for responses; storage keeps only
/// the attribute id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerAttribute {
    pub owner_id: i64,
    pub attribute_id: i64,
    pub key: String,
    pub value: Option<String>,
}

/// A reference to an attribute, either by existing id or by key.
///
/// Exactly one of `id` and `key` must be set, and `key` must not be blank.
/// References violating this are dropped during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInput {
    pub id: Option<i64>,
    pub key: Option<String>,
    pub value: Option<String>,
}

impl AttributeInput {
    pub fn by_id(id: i64, value: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            key: None,
            value: Some(value.into()),
        }
    }

    pub fn by_key(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    /// The resolution token (`id:<n>` or `key:<s>`), or `None` for an invalid
    /// reference.
    pub fn token(&self) -> Option<String> {
        match (self.id, self.key.as_deref()) {
            (Some(id), None) => Some(id_token(id)),
            (None, Some(key)) if !key.trim().is_empty() => Some(key_token(key)),
            _ => None,
        }
    }
}

pub fn id_token(id: i64) -> String {
    format!("id:{}", id)
}

pub fn key_token(key: &str) -> String {
    format!("key:{}", key)
}

/// An entity carrying an attribute collection.
pub trait AttributeOwner {
    const KIND: OwnerKind;

    fn owner_id(&self) -> i64;
    fn attributes(&self) -> &[OwnerAttribute];
    fn attributes_mut(&mut self) -> &mut Vec<OwnerAttribute>;
}
