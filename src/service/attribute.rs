//! Attribute resolution and the generic create/replace/patch merge used by every
//! attribute-like child collection.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{join_ids, Result, TmsError};
use crate::models::{
    id_token, key_token, Attribute, AttributeInput, AttributeOwner, OwnerAttribute, OwnerKind,
};
use crate::repository::{AttributeRepository, CaseScope, OwnerAttributeRepository};

/// Resolves "by id or by key" references into stored attributes.
pub struct AttributeResolver {
    repo: Arc<dyn AttributeRepository>,
}

impl AttributeResolver {
    pub fn new(repo: Arc<dyn AttributeRepository>) -> Self {
        Self { repo }
    }

    /// Maps each valid input's token (`id:<n>` / `key:<s>`) to its attribute.
    ///
    /// Unknown ids fail with a `NotFound` naming every missing id. Unknown keys
    /// are created in a single batch. Invalid inputs are skipped.
    pub fn resolve(&self, inputs: &[AttributeInput]) -> Result<HashMap<String, Attribute>> {
        let mut ids = BTreeSet::new();
        let mut keys = BTreeSet::new();
        for input in inputs {
            match (input.id, input.key.as_deref()) {
                (Some(id), None) => {
                    ids.insert(id);
                }
                (None, Some(key)) if !key.trim().is_empty() => {
                    keys.insert(key.to_string());
                }
                _ => warn!(?input, "Dropping attribute reference without exactly one of id or key"),
            }
        }

        let mut resolved = HashMap::new();
        if !ids.is_empty() {
            resolved.extend(self.resolve_ids(ids.into_iter().collect())?);
        }
        if !keys.is_empty() {
            resolved.extend(self.resolve_keys(keys.into_iter().collect())?);
        }
        Ok(resolved)
    }

    fn resolve_ids(&self, ids: Vec<i64>) -> Result<HashMap<String, Attribute>> {
        let found = self.repo.find_all_by_id(&ids)?;
        let found_ids: HashSet<i64> = found.iter().map(|a| a.id).collect();
        let missing: Vec<i64> = ids
            .into_iter()
            .filter(|id| !found_ids.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(TmsError::not_found(format!(
                "Attributes with ids [{}] not found",
                join_ids(&missing)
            )));
        }

        Ok(found.into_iter().map(|a| (id_token(a.id), a)).collect())
    }

    fn resolve_keys(&self, keys: Vec<String>) -> Result<HashMap<String, Attribute>> {
        let mut resolved: HashMap<String, Attribute> = self
            .repo
            .find_all_by_key(&keys)?
            .into_iter()
            .map(|a| (key_token(&a.key), a))
            .collect();

        let new_keys: Vec<String> = keys
            .into_iter()
            .filter(|key| !resolved.contains_key(&key_token(key)))
            .collect();
        if !new_keys.is_empty() {
            debug!(count = new_keys.len(), "Creating attributes for unknown keys");
            for attribute in self.repo.save_all(&new_keys)? {
                resolved.insert(key_token(&attribute.key), attribute);
            }
        }
        Ok(resolved)
    }
}

/// Describes how one owner kind stores one kind of child collection.
pub trait CollectionBinding {
    type Owner;
    type Record;
    type Input;

    fn owner_id(&self, owner: &Self::Owner) -> i64;
    fn records_mut<'o>(&self, owner: &'o mut Self::Owner) -> &'o mut Vec<Self::Record>;
    /// Builds child records for `inputs`, each pointing back at `owner`.
    fn build(&self, owner: &Self::Owner, inputs: &[Self::Input]) -> Result<Vec<Self::Record>>;
    fn save_all(&self, records: &[Self::Record]) -> Result<()>;
    fn delete_all_by_owner(&self, owner_id: i64) -> Result<()>;
}

/// Attaches a new collection to `owner`. Empty input is a no-op.
pub fn create_collection<B: CollectionBinding>(
    binding: &B,
    owner: &mut B::Owner,
    inputs: &[B::Input],
) -> Result<()> {
    if inputs.is_empty() {
        return Ok(());
    }
    let records = binding.build(owner, inputs)?;
    if !records.is_empty() {
        binding.save_all(&records)?;
    }
    *binding.records_mut(owner) = records;
    Ok(())
}

/// Deletes the owner's collection, then creates it from `inputs`.
///
/// Empty input clears the collection.
pub fn replace_collection<B: CollectionBinding>(
    binding: &B,
    owner: &mut B::Owner,
    inputs: &[B::Input],
) -> Result<()> {
    binding.delete_all_by_owner(binding.owner_id(owner))?;
    binding.records_mut(owner).clear();
    create_collection(binding, owner, inputs)
}

/// Adds records for `inputs` to the existing collection. Existing records
/// are left untouched; the binding skips records the owner already holds.
pub fn patch_collection<B: CollectionBinding>(
    binding: &B,
    owner: &mut B::Owner,
    inputs: &[B::Input],
) -> Result<()> {
    if inputs.is_empty() {
        return Ok(());
    }
    let records = binding.build(owner, inputs)?;
    if !records.is_empty() {
        binding.save_all(&records)?;
    }
    binding.records_mut(owner).extend(records);
    Ok(())
}

/// Binds the [`OwnerAttribute`] join table to an owner type.
pub struct OwnerAttributeBinding<'a, O> {
    resolver: &'a AttributeResolver,
    store: &'a dyn OwnerAttributeRepository,
    _owner: PhantomData<fn(&O)>,
}

impl<'a, O: AttributeOwner> CollectionBinding for OwnerAttributeBinding<'a, O> {
    type Owner = O;
    type Record = OwnerAttribute;
    type Input = AttributeInput;

    fn owner_id(&self, owner: &O) -> i64 {
        owner.owner_id()
    }

    fn records_mut<'o>(&self, owner: &'o mut O) -> &'o mut Vec<OwnerAttribute> {
        owner.attributes_mut()
    }

    fn build(&self, owner: &O, inputs: &[AttributeInput]) -> Result<Vec<OwnerAttribute>> {
        let resolved = self.resolver.resolve(inputs)?;
        let owner_id = owner.owner_id();
        let mut seen: HashSet<(i64, Option<String>)> = owner
            .attributes()
            .iter()
            .map(|a| (a.attribute_id, a.value.clone()))
            .collect();
        Ok(inputs
            .iter()
            .filter_map(|input| {
                let attribute = resolved.get(&input.token()?)?;
                // Already held by the owner or earlier in this batch.
                if !seen.insert((attribute.id, input.value.clone())) {
                    return None;
                }
                Some(OwnerAttribute {
                    owner_id,
                    attribute_id: attribute.id,
                    key: attribute.key.clone(),
                    value: input.value.clone(),
                })
            })
            .collect())
    }

    fn save_all(&self, records: &[OwnerAttribute]) -> Result<()> {
        self.store.save_all(O::KIND, records)
    }

    fn delete_all_by_owner(&self, owner_id: i64) -> Result<()> {
        self.store.delete_all_by_owner(O::KIND, owner_id)
    }
}

/// Attribute collections of test cases, manual scenarios and test plans.
pub struct AttributeService {
    resolver: AttributeResolver,
    store: Arc<dyn OwnerAttributeRepository>,
}

impl AttributeService {
    pub fn new(
        attributes: Arc<dyn AttributeRepository>,
        store: Arc<dyn OwnerAttributeRepository>,
    ) -> Self {
        Self {
            resolver: AttributeResolver::new(attributes),
            store,
        }
    }

    pub fn resolver(&self) -> &AttributeResolver {
        &self.resolver
    }

    fn binding<O: AttributeOwner>(&self) -> OwnerAttributeBinding<'_, O> {
        OwnerAttributeBinding {
            resolver: &self.resolver,
            store: self.store.as_ref(),
            _owner: PhantomData,
        }
    }

    pub fn create<O: AttributeOwner>(&self, owner: &mut O, inputs: &[AttributeInput]) -> Result<()> {
        create_collection(&self.binding::<O>(), owner, inputs)
    }

    pub fn replace<O: AttributeOwner>(&self, owner: &mut O, inputs: &[AttributeInput]) -> Result<()> {
        replace_collection(&self.binding::<O>(), owner, inputs)
    }

    pub fn patch<O: AttributeOwner>(&self, owner: &mut O, inputs: &[AttributeInput]) -> Result<()> {
        patch_collection(&self.binding::<O>(), owner, inputs)
    }

    pub fn find_all(&self, kind: OwnerKind, owner_id: i64) -> Result<Vec<OwnerAttribute>> {
        self.store.find_all_by_owner(kind, owner_id)
    }

    pub fn delete_all(&self, kind: OwnerKind, owner_id: i64) -> Result<()> {
        self.store.delete_all_by_owner(kind, owner_id)
    }

    pub fn delete_by_case_scope(&self, kind: OwnerKind, scope: &CaseScope) -> Result<()> {
        self.store.delete_by_case_scope(kind, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestCase;
    use crate::repository::{MockAttributeRepository, MockOwnerAttributeRepository};
    use chrono::Utc;
    use mockall::predicate::*;

    fn test_case(id: i64) -> TestCase {
        TestCase {
            id,
            project_id: 1,
            test_folder_id: 1,
            name: "Login".to_string(),
            description: None,
            tags: Vec::new(),
            default_version: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn existing_tag(owner_id: i64, attribute_id: i64, key: &str) -> OwnerAttribute {
        OwnerAttribute {
            owner_id,
            attribute_id,
            key: key.to_string(),
            value: Some("old".to_string()),
        }
    }

    #[test]
    fn test_resolve_empty_input_touches_no_storage() {
        let repo = MockAttributeRepository::new();
        let resolver = AttributeResolver::new(Arc::new(repo));

        let resolved = resolver.resolve(&[]).unwrap();

        assert!(resolved.is_empty());
    }

    #[test]
    fn test_resolve_same_new_key_twice_creates_one_attribute() {
        let mut repo = MockAttributeRepository::new();
        repo.expect_find_all_by_key()
            .withf(|keys| keys == ["priority".to_string()])
            .times(1)
            .returning(|_| Ok(vec![]));
        repo.expect_save_all()
            .withf(|keys| keys == ["priority".to_string()])
            .times(1)
            .returning(|keys| {
                Ok(keys
                    .iter()
                    .map(|k| Attribute {
                        id: 7,
                        key: k.clone(),
                    })
                    .collect())
            });
        let resolver = AttributeResolver::new(Arc::new(repo));

        let resolved = resolver
            .resolve(&[
                AttributeInput::by_key("priority", "high"),
                AttributeInput::by_key("priority", "low"),
            ])
            .unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["key:priority"].id, 7);
    }

    #[test]
    fn test_resolve_reports_all_missing_ids() {
        let mut repo = MockAttributeRepository::new();
        repo.expect_find_all_by_id().returning(|_| {
            Ok(vec![Attribute {
                id: 1,
                key: "component".to_string(),
            }])
        });
        let resolver = AttributeResolver::new(Arc::new(repo));

        let err = resolver
            .resolve(&[
                AttributeInput::by_id(1, "a"),
                AttributeInput::by_id(999, "b"),
                AttributeInput::by_id(888, "c"),
            ])
            .unwrap_err();

        assert!(err.is_not_found());
        let msg = err.to_string();
        assert!(msg.contains("999"));
        assert!(msg.contains("888"));
        assert!(!msg.contains("[1"));
    }

    #[test]
    fn test_resolve_mixes_ids_and_keys_and_drops_invalid() {
        let mut repo = MockAttributeRepository::new();
        repo.expect_find_all_by_id().withf(|ids| ids == [3]).returning(|_| {
            Ok(vec![Attribute {
                id: 3,
                key: "os".to_string(),
            }])
        });
        repo.expect_find_all_by_key()
            .withf(|keys| keys == ["browser".to_string()])
            .returning(|_| {
                Ok(vec![Attribute {
                    id: 4,
                    key: "browser".to_string(),
                }])
            });
        repo.expect_save_all().never();
        let resolver = AttributeResolver::new(Arc::new(repo));

        let resolved = resolver
            .resolve(&[
                AttributeInput::by_id(3, "linux"),
                AttributeInput::by_key("browser", "firefox"),
                AttributeInput {
                    id: Some(5),
                    key: Some("both".to_string()),
                    value: None,
                },
                AttributeInput::by_key("   ", "blank"),
                AttributeInput::default(),
            ])
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["id:3"].key, "os");
        assert_eq!(resolved["key:browser"].id, 4);
    }

    fn service_with_known_keys(store: MockOwnerAttributeRepository) -> AttributeService {
        let mut attributes = MockAttributeRepository::new();
        attributes.expect_find_all_by_key().returning(|keys| {
            Ok(keys
                .iter()
                .enumerate()
                .map(|(i, k)| Attribute {
                    id: 100 + i as i64,
                    key: k.clone(),
                })
                .collect())
        });
        AttributeService::new(Arc::new(attributes), Arc::new(store))
    }

    #[test]
    fn test_create_with_empty_input_is_noop() {
        let mut store = MockOwnerAttributeRepository::new();
        store.expect_save_all().never();
        let service = service_with_known_keys(store);
        let mut owner = test_case(1);

        service.create(&mut owner, &[]).unwrap();

        assert!(owner.tags.is_empty());
    }

    #[test]
    fn test_create_sets_back_reference_and_collection() {
        let mut store = MockOwnerAttributeRepository::new();
        store
            .expect_save_all()
            .withf(|kind, records| {
                *kind == OwnerKind::TestCase && records.len() == 1 && records[0].owner_id == 42
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let service = service_with_known_keys(store);
        let mut owner = test_case(42);

        service
            .create(&mut owner, &[AttributeInput::by_key("smoke", "yes")])
            .unwrap();

        assert_eq!(owner.tags.len(), 1);
        assert_eq!(owner.tags[0].owner_id, 42);
        assert_eq!(owner.tags[0].key, "smoke");
        assert_eq!(owner.tags[0].value.as_deref(), Some("yes"));
    }

    #[test]
    fn test_replace_leaves_only_new_records() {
        let mut store = MockOwnerAttributeRepository::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_delete_all_by_owner()
            .with(eq(OwnerKind::TestCase), eq(1i64))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store
            .expect_save_all()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let service = service_with_known_keys(store);
        let mut owner = test_case(1);
        owner.tags.push(existing_tag(1, 9, "legacy"));

        service
            .replace(
                &mut owner,
                &[
                    AttributeInput::by_key("a", "1"),
                    AttributeInput::by_key("b", "2"),
                ],
            )
            .unwrap();

        let keys: Vec<_> = owner.tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_replace_with_empty_input_only_clears() {
        let mut store = MockOwnerAttributeRepository::new();
        store
            .expect_delete_all_by_owner()
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_save_all().never();
        let service = service_with_known_keys(store);
        let mut owner = test_case(1);
        owner.tags.push(existing_tag(1, 9, "legacy"));

        service.replace(&mut owner, &[]).unwrap();

        assert!(owner.tags.is_empty());
    }

    #[test]
    fn test_patch_unions_with_existing_records() {
        let mut store = MockOwnerAttributeRepository::new();
        store.expect_delete_all_by_owner().never();
        store.expect_save_all().times(1).returning(|_, _| Ok(()));
        let service = service_with_known_keys(store);
        let mut owner = test_case(1);
        owner.tags.push(existing_tag(1, 9, "legacy"));

        service
            .patch(
                &mut owner,
                &[
                    AttributeInput::by_key("a", "1"),
                    AttributeInput::by_key("b", "2"),
                ],
            )
            .unwrap();

        let keys: Vec<_> = owner.tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["legacy", "a", "b"]);
        assert_eq!(owner.tags[0].value.as_deref(), Some("old"));
    }

    #[test]
    fn test_patch_skips_records_already_held() {
        let mut store = MockOwnerAttributeRepository::new();
        store
            .expect_save_all()
            .withf(|_, records| records.len() == 1 && records[0].key == "b")
            .times(1)
            .returning(|_, _| Ok(()));
        let service = service_with_known_keys(store);
        let mut owner = test_case(1);
        owner.tags.push(existing_tag(1, 100, "a"));

        service
            .patch(
                &mut owner,
                &[
                    AttributeInput::by_key("a", "old"),
                    AttributeInput::by_key("b", "2"),
                    AttributeInput::by_key("b", "2"),
                ],
            )
            .unwrap();

        let keys: Vec<_> = owner.tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_patch_with_only_held_records_saves_nothing() {
        let mut store = MockOwnerAttributeRepository::new();
        store.expect_save_all().never();
        let service = service_with_known_keys(store);
        let mut owner = test_case(1);
        owner.tags.push(existing_tag(1, 100, "a"));

        service
            .patch(&mut owner, &[AttributeInput::by_key("a", "old")])
            .unwrap();

        assert_eq!(owner.tags.len(), 1);
    }
}
