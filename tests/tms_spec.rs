use speculate2::speculate;
use tms::db::Database;
use tms::models::*;
use tms::repository::AttributeRepository;
use tms::{Tms, TmsError};

const PROJECT: i64 = 1;

fn create_folder(tms: &Tms, name: &str, parent: Option<i64>) -> TestFolder {
    tms.folders
        .create(
            PROJECT,
            &TestFolderInput {
                name: Some(name.to_string()),
                parent_test_folder_id: parent,
                ..Default::default()
            },
        )
        .expect("Failed to create folder")
}

fn tagged_case_input(folder_id: i64, name: &str, tags: Vec<AttributeInput>) -> TestCaseInput {
    TestCaseInput {
        test_folder_id: Some(folder_id),
        name: Some(name.to_string()),
        description: None,
        tags,
        default_version: None,
    }
}

fn text_case_input(folder_id: i64, name: &str) -> TestCaseInput {
    TestCaseInput {
        test_folder_id: Some(folder_id),
        name: Some(name.to_string()),
        description: Some("Checks the login form".to_string()),
        tags: vec![
            AttributeInput::by_key("priority", "high"),
            AttributeInput::by_key("component", "auth"),
        ],
        default_version: Some(TestCaseVersionInput {
            name: Some("v1".to_string()),
            manual_scenario: Some(ManualScenarioInput::text(
                "Enter valid credentials",
                "User is signed in",
            )),
        }),
    }
}

fn step(instructions: &str, expected: &str) -> Step {
    Step {
        instructions: Some(instructions.to_string()),
        expected_result: Some(expected.to_string()),
        attachments: Vec::new(),
    }
}

fn tag_keys(test_case: &TestCase) -> Vec<String> {
    let mut keys: Vec<String> = test_case.tags.iter().map(|t| t.key.clone()).collect();
    keys.sort();
    keys
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let tms = Tms::new(db);
    }

    describe "test folders" {
        it "creates a root folder" {
            let folder = create_folder(&tms, "Regression", None);

            assert!(folder.id > 0);
            assert_eq!(folder.project_id, PROJECT);
            assert!(folder.parent_folder_id.is_none());
        }

        it "rejects a blank name" {
            let err = tms.folders.create(PROJECT, &TestFolderInput::named("  ")).unwrap_err();
            assert!(err.is_validation());
        }

        it "creates a missing parent by name as a root" {
            let folder = tms.folders.create(PROJECT, &TestFolderInput {
                name: Some("Login".to_string()),
                parent_test_folder: Some(ParentFolderInput {
                    name: "Web".to_string(),
                    description: Some("Browser suites".to_string()),
                }),
                ..Default::default()
            }).expect("Failed to create folder");

            let parent = tms.folders
                .get_by_id(PROJECT, folder.parent_folder_id.expect("parent set"))
                .expect("Parent missing");
            assert_eq!(parent.name, "Web");
            assert_eq!(parent.description.as_deref(), Some("Browser suites"));
            assert!(parent.parent_folder_id.is_none());
        }

        it "reuses an existing parent found by name" {
            let web = create_folder(&tms, "Web", None);

            let folder = tms.folders.create(PROJECT, &TestFolderInput {
                name: Some("Login".to_string()),
                parent_test_folder: Some(ParentFolderInput {
                    name: "Web".to_string(),
                    description: None,
                }),
                ..Default::default()
            }).expect("Failed to create folder");

            assert_eq!(folder.parent_folder_id, Some(web.id));
            assert_eq!(tms.folders.find_all(PROJECT).expect("Query failed").len(), 2);
        }

        it "does not see folders of another project" {
            let folder = create_folder(&tms, "Regression", None);

            let err = tms.folders.get_by_id(2, folder.id).unwrap_err();
            assert!(err.is_not_found());
        }

        it "builds the full hierarchy below a folder" {
            let root = create_folder(&tms, "Root", None);
            let a = create_folder(&tms, "A", Some(root.id));
            create_folder(&tms, "A1", Some(a.id));
            create_folder(&tms, "B", Some(root.id));
            create_folder(&tms, "Elsewhere", None);

            let tree = tms.folders
                .find_folder_with_full_hierarchy(PROJECT, root.id)
                .expect("Failed to load hierarchy");

            assert_eq!(tree.folder.id, root.id);
            let names: Vec<_> = tree.sub_test_folders.iter().map(|n| n.folder.name.as_str()).collect();
            assert_eq!(names, vec!["A", "B"]);
            assert_eq!(tree.sub_test_folders[0].sub_test_folders[0].folder.name, "A1");
            assert_eq!(tree.walk().len(), 4);
        }

        it "returns a lone folder as a single node" {
            let root = create_folder(&tms, "Alone", None);

            let tree = tms.folders
                .find_folder_with_full_hierarchy(PROJECT, root.id)
                .expect("Failed to load hierarchy");

            assert!(tree.sub_test_folders.is_empty());
        }

        it "creates the folder when updating an unknown id" {
            let folder = tms.folders
                .update(PROJECT, 999, &TestFolderInput::named("Fresh"))
                .expect("Update failed");

            assert_eq!(folder.name, "Fresh");
            assert_ne!(folder.id, 999);
        }

        it "clears the description on update but keeps it on patch" {
            let folder = tms.folders.create(PROJECT, &TestFolderInput {
                name: Some("Docs".to_string()),
                description: Some("keep me".to_string()),
                ..Default::default()
            }).expect("Failed to create");

            let patched = tms.folders
                .patch(PROJECT, folder.id, &TestFolderInput::named("Docs v2"))
                .expect("Patch failed");
            assert_eq!(patched.description.as_deref(), Some("keep me"));

            let updated = tms.folders
                .update(PROJECT, folder.id, &TestFolderInput::named("Docs v3"))
                .expect("Update failed");
            assert!(updated.description.is_none());
            assert_eq!(tms.folders.get_by_id(PROJECT, folder.id).unwrap().name, "Docs v3");
        }

        it "fails to patch an unknown folder" {
            let err = tms.folders.patch(PROJECT, 999, &TestFolderInput::named("x")).unwrap_err();
            assert!(err.is_not_found());
        }

        it "refuses to move a folder under its own descendant" {
            let root = create_folder(&tms, "Root", None);
            let child = create_folder(&tms, "Child", Some(root.id));

            let err = tms.folders.patch(PROJECT, root.id, &TestFolderInput {
                parent_test_folder_id: Some(child.id),
                ..Default::default()
            }).unwrap_err();

            assert!(err.is_validation());
            assert!(tms.folders.get_by_id(PROJECT, root.id).unwrap().parent_folder_id.is_none());
        }
    }

    describe "test cases" {
        it "round-trips tags and a text scenario" {
            let folder = create_folder(&tms, "Auth", None);
            let created = tms.test_cases
                .create(PROJECT, &text_case_input(folder.id, "Login works"))
                .expect("Failed to create test case");

            let loaded = tms.test_cases.get_by_id(PROJECT, created.id).expect("Failed to load");

            assert_eq!(loaded.name, "Login works");
            assert_eq!(loaded.test_folder_id, folder.id);
            assert_eq!(tag_keys(&loaded), vec!["component", "priority"]);
            assert!(loaded.tags.iter().all(|t| t.owner_id == created.id));

            let version = loaded.default_version.expect("default version");
            assert!(version.is_default);
            assert_eq!(version.name.as_deref(), Some("v1"));
            let scenario = version.manual_scenario.expect("scenario");
            assert_eq!(scenario.test_case_version_id, version.id);
            assert_eq!(scenario.scenario_type, ScenarioType::Text);
            assert_eq!(scenario.variant, Some(ScenarioVariant::Text(TextScenario {
                instructions: Some("Enter valid credentials".to_string()),
                expected_result: Some("User is signed in".to_string()),
            })));
        }

        it "keeps step order for a steps scenario" {
            let folder = create_folder(&tms, "Checkout", None);
            let mut input = tagged_case_input(folder.id, "Pay by card", vec![]);
            let mut first = step("Add item", "Cart has one item");
            first.attachments.push(Attachment {
                file_name: "cart.png".to_string(),
                file_id: Some("f-1".to_string()),
            });
            input.default_version = Some(TestCaseVersionInput {
                name: None,
                manual_scenario: Some(ManualScenarioInput::steps(vec![
                    first,
                    step("Pay", "Receipt shown"),
                    step("Log out", "Login page"),
                ])),
            });
            let created = tms.test_cases.create(PROJECT, &input).expect("Failed to create");

            let loaded = tms.test_cases.get_by_id(PROJECT, created.id).expect("Failed to load");
            let scenario = loaded.default_version.unwrap().manual_scenario.unwrap();

            match scenario.variant {
                Some(ScenarioVariant::Steps(body)) => {
                    let order: Vec<_> = body.steps.iter()
                        .map(|s| s.instructions.clone().unwrap())
                        .collect();
                    assert_eq!(order, vec!["Add item", "Pay", "Log out"]);
                    assert_eq!(body.steps[0].attachments[0].file_name, "cart.png");
                }
                other => panic!("expected steps, got {:?}", other),
            }
        }

        it "creates one attribute for a key used twice" {
            let folder = create_folder(&tms, "Tags", None);
            tms.test_cases.create(PROJECT, &tagged_case_input(folder.id, "Twice", vec![
                AttributeInput::by_key("browser", "chrome"),
                AttributeInput::by_key("browser", "firefox"),
            ])).expect("Failed to create");

            let attributes = tms.database()
                .find_all_by_key(&["browser".to_string()])
                .expect("Query failed");
            assert_eq!(attributes.len(), 1);
        }

        it "reuses attributes across test cases" {
            let folder = create_folder(&tms, "Tags", None);
            let a = tms.test_cases.create(PROJECT, &tagged_case_input(folder.id, "A", vec![
                AttributeInput::by_key("os", "linux"),
            ])).expect("Failed to create");
            let b = tms.test_cases.create(PROJECT, &tagged_case_input(folder.id, "B", vec![
                AttributeInput::by_id(a.tags[0].attribute_id, "mac"),
            ])).expect("Failed to create");

            assert_eq!(a.tags[0].attribute_id, b.tags[0].attribute_id);
            assert_eq!(b.tags[0].key, "os");
            assert_eq!(b.tags[0].value.as_deref(), Some("mac"));
        }

        it "reports every unknown attribute id" {
            let folder = create_folder(&tms, "Tags", None);
            let existing = tms.test_cases.create(PROJECT, &tagged_case_input(folder.id, "Seed", vec![
                AttributeInput::by_key("seed", "1"),
            ])).expect("Failed to create");
            let known = existing.tags[0].attribute_id;

            let err = tms.transaction(|| {
                tms.test_cases.create(PROJECT, &tagged_case_input(folder.id, "Bad", vec![
                    AttributeInput::by_id(known, "ok"),
                    AttributeInput::by_id(999, "x"),
                    AttributeInput::by_id(888, "y"),
                ]))
            }).unwrap_err();

            assert!(err.is_not_found());
            let message = err.to_string();
            assert!(message.contains("999"));
            assert!(message.contains("888"));
            assert_eq!(tms.test_cases.find_by_folder(PROJECT, folder.id).unwrap().len(), 1);
        }

        it "replaces tags on update and unions them on patch" {
            let folder = create_folder(&tms, "Merge", None);
            let base = tagged_case_input(folder.id, "Merge", vec![AttributeInput::by_key("old", "1")]);
            let replaced = tms.test_cases.create(PROJECT, &base).expect("Failed to create");
            let patched = tms.test_cases.create(PROJECT, &base).expect("Failed to create");
            let incoming = tagged_case_input(folder.id, "Merge", vec![
                AttributeInput::by_key("a", "1"),
                AttributeInput::by_key("b", "2"),
            ]);

            tms.test_cases.update(PROJECT, replaced.id, &incoming).expect("Update failed");
            tms.test_cases.patch(PROJECT, patched.id, &incoming).expect("Patch failed");

            let replaced = tms.test_cases.get_by_id(PROJECT, replaced.id).unwrap();
            let patched = tms.test_cases.get_by_id(PROJECT, patched.id).unwrap();
            assert_eq!(tag_keys(&replaced), vec!["a", "b"]);
            assert_eq!(tag_keys(&patched), vec!["a", "b", "old"]);
        }

        it "keeps a tag the test case already has when patching it in again" {
            let folder = create_folder(&tms, "Repeat", None);
            let created = tms.test_cases.create(PROJECT, &tagged_case_input(
                folder.id,
                "Repeat",
                vec![AttributeInput::by_key("priority", "high")],
            )).expect("Failed to create");

            tms.test_cases.patch(PROJECT, created.id, &tagged_case_input(
                folder.id,
                "Repeat",
                vec![
                    AttributeInput::by_key("priority", "high"),
                    AttributeInput::by_key("priority", "low"),
                ],
            )).expect("Patch failed");

            let loaded = tms.test_cases.get_by_id(PROJECT, created.id).unwrap();
            let mut values: Vec<_> = loaded.tags.iter().filter_map(|t| t.value.clone()).collect();
            values.sort();
            assert_eq!(values, vec!["high", "low"]);
        }

        it "creates a default version on update but not on patch" {
            let folder = create_folder(&tms, "Versions", None);
            let patched = tms.test_cases
                .create(PROJECT, &tagged_case_input(folder.id, "No version", vec![]))
                .expect("Failed to create");
            let updated = tms.test_cases
                .create(PROJECT, &tagged_case_input(folder.id, "No version", vec![]))
                .expect("Failed to create");
            let mut input = tagged_case_input(folder.id, "No version", vec![]);
            input.default_version = Some(TestCaseVersionInput {
                name: Some("v1".to_string()),
                manual_scenario: None,
            });

            let err = tms.test_cases.patch(PROJECT, patched.id, &input).unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(
                err.to_string(),
                format!("Default test case version for test case {} not found", patched.id)
            );

            let result = tms.test_cases.update(PROJECT, updated.id, &input).expect("Update failed");
            assert!(result.default_version.is_some());
        }

        it "fails to patch a missing scenario" {
            let folder = create_folder(&tms, "Scenarios", None);
            let mut input = tagged_case_input(folder.id, "Bare version", vec![]);
            input.default_version = Some(TestCaseVersionInput::default());
            let created = tms.test_cases.create(PROJECT, &input).expect("Failed to create");
            let version_id = created.default_version.as_ref().unwrap().id;

            input.default_version = Some(TestCaseVersionInput {
                name: None,
                manual_scenario: Some(ManualScenarioInput::text("a", "b")),
            });
            let err = tms.test_cases.patch(PROJECT, created.id, &input).unwrap_err();

            assert!(matches!(err, TmsError::NotFound(_)));
            assert_eq!(
                err.to_string(),
                format!("Manual Scenario for the test case version with id {} not found", version_id)
            );
        }

        it "patches only the scenario fields that are present" {
            let folder = create_folder(&tms, "Scenarios", None);
            let created = tms.test_cases
                .create(PROJECT, &text_case_input(folder.id, "Patch me"))
                .expect("Failed to create");
            let mut input = tagged_case_input(folder.id, "Patch me", vec![]);
            let mut scenario = ManualScenarioInput::text("ignored", "Dashboard shown");
            if let ScenarioBodyInput::Text(body) = &mut scenario.body {
                body.instructions = None;
            }
            scenario.preconditions = Some("Account exists".to_string());
            input.default_version = Some(TestCaseVersionInput {
                name: None,
                manual_scenario: Some(scenario),
            });

            tms.test_cases.patch(PROJECT, created.id, &input).expect("Patch failed");

            let loaded = tms.test_cases.get_by_id(PROJECT, created.id).unwrap();
            let version = loaded.default_version.unwrap();
            assert_eq!(version.name.as_deref(), Some("v1"));
            let scenario = version.manual_scenario.unwrap();
            assert_eq!(scenario.preconditions.as_deref(), Some("Account exists"));
            assert_eq!(scenario.variant, Some(ScenarioVariant::Text(TextScenario {
                instructions: Some("Enter valid credentials".to_string()),
                expected_result: Some("Dashboard shown".to_string()),
            })));
        }

        it "switches the scenario type on update" {
            let folder = create_folder(&tms, "Scenarios", None);
            let created = tms.test_cases
                .create(PROJECT, &text_case_input(folder.id, "Switch"))
                .expect("Failed to create");
            let mut input = text_case_input(folder.id, "Switch");
            input.default_version = Some(TestCaseVersionInput {
                name: Some("v2".to_string()),
                manual_scenario: Some(ManualScenarioInput::steps(vec![step("One", "Done")])),
            });

            tms.transaction(|| tms.test_cases.update(PROJECT, created.id, &input))
                .expect("Update failed");

            let scenario = tms.test_cases.get_by_id(PROJECT, created.id).unwrap()
                .default_version.unwrap()
                .manual_scenario.unwrap();
            assert_eq!(scenario.scenario_type, ScenarioType::Steps);
            assert!(matches!(scenario.variant, Some(ScenarioVariant::Steps(_))));
        }

        it "deletes a test case with everything it owns but keeps attributes" {
            let folder = create_folder(&tms, "Delete", None);
            let created = tms.test_cases
                .create(PROJECT, &text_case_input(folder.id, "Short lived"))
                .expect("Failed to create");

            tms.transaction(|| tms.test_cases.delete(PROJECT, created.id)).expect("Delete failed");

            assert!(tms.test_cases.get_by_id(PROJECT, created.id).unwrap_err().is_not_found());
            let attributes = tms.database()
                .find_all_by_key(&["priority".to_string(), "component".to_string()])
                .expect("Query failed");
            assert_eq!(attributes.len(), 2);
        }

        it "treats deleting a missing test case as a no-op" {
            tms.test_cases.delete(PROJECT, 12345).expect("Delete failed");
        }

        it "deletes test cases by id" {
            let folder = create_folder(&tms, "Bulk", None);
            let a = tms.test_cases.create(PROJECT, &text_case_input(folder.id, "A")).unwrap();
            let b = tms.test_cases.create(PROJECT, &text_case_input(folder.id, "B")).unwrap();
            let c = tms.test_cases.create(PROJECT, &text_case_input(folder.id, "C")).unwrap();

            tms.transaction(|| tms.test_cases.delete_by_ids(&[a.id, b.id])).expect("Delete failed");

            let remaining: Vec<_> = tms.test_cases.find_by_folder(PROJECT, folder.id).unwrap()
                .into_iter().map(|tc| tc.id).collect();
            assert_eq!(remaining, vec![c.id]);
        }
    }

    describe "folder deletion" {
        it "removes the subtree and every test case under it" {
            let root = create_folder(&tms, "Root", None);
            let child = create_folder(&tms, "Child", Some(root.id));
            let grandchild = create_folder(&tms, "Grandchild", Some(child.id));
            let other = create_folder(&tms, "Other", None);
            let doomed = tms.test_cases.create(PROJECT, &text_case_input(grandchild.id, "Deep")).unwrap();
            let kept = tms.test_cases.create(PROJECT, &text_case_input(other.id, "Kept")).unwrap();

            tms.transaction(|| tms.folders.delete(PROJECT, root.id)).expect("Delete failed");

            let remaining: Vec<_> = tms.folders.find_all(PROJECT).unwrap()
                .into_iter().map(|f| f.id).collect();
            assert_eq!(remaining, vec![other.id]);
            assert!(tms.test_cases.get_by_id(PROJECT, doomed.id).unwrap_err().is_not_found());
            assert!(tms.test_cases.get_by_id(PROJECT, kept.id).is_ok());
        }

        it "deletes only the subtree of a nested folder" {
            let root = create_folder(&tms, "Root", None);
            let child = create_folder(&tms, "Child", Some(root.id));

            tms.folders.delete(PROJECT, child.id).expect("Delete failed");

            let tree = tms.folders.find_folder_with_full_hierarchy(PROJECT, root.id).unwrap();
            assert!(tree.sub_test_folders.is_empty());
        }

        it "treats deleting a missing folder as a no-op" {
            tms.folders.delete(PROJECT, 4242).expect("Delete failed");
        }
    }

    describe "transactions" {
        it "rolls back every write when the operation fails" {
            let result: Result<(), TmsError> = tms.transaction(|| {
                create_folder(&tms, "Temporary", None);
                Err(TmsError::validation("abort"))
            });

            assert!(result.unwrap_err().is_validation());
            assert!(tms.folders.find_all(PROJECT).unwrap().is_empty());
        }

        it "rolls back a partially created test case" {
            let folder = create_folder(&tms, "Atomic", None);
            let mut input = text_case_input(folder.id, "Half done");
            input.tags.push(AttributeInput::by_id(777, "missing"));

            let err = tms.transaction(|| tms.test_cases.create(PROJECT, &input)).unwrap_err();

            assert!(err.is_not_found());
            assert!(tms.test_cases.find_by_folder(PROJECT, folder.id).unwrap().is_empty());
            let created_keys = tms.database()
                .find_all_by_key(&["priority".to_string()])
                .unwrap();
            assert!(created_keys.is_empty());
        }
    }

    describe "test plans" {
        it "attaches milestones and attributes" {
            let m1 = tms.milestones.create(PROJECT, &MilestoneInput { name: "Beta".to_string() }).unwrap();
            let m2 = tms.milestones.create(PROJECT, &MilestoneInput { name: "GA".to_string() }).unwrap();

            let plan = tms.test_plans.create(PROJECT, &TestPlanInput {
                name: Some("Release 1".to_string()),
                description: None,
                attributes: vec![AttributeInput::by_key("team", "core")],
                milestone_ids: vec![m1.id],
            }).expect("Failed to create plan");

            let patched = tms.test_plans.patch(PROJECT, plan.id, &TestPlanInput {
                milestone_ids: vec![m1.id, m2.id],
                attributes: vec![AttributeInput::by_key("risk", "low")],
                ..Default::default()
            }).expect("Patch failed");

            let loaded = tms.test_plans.get_by_id(PROJECT, plan.id).unwrap();
            assert_eq!(patched.name, "Release 1");
            assert_eq!(loaded.milestones.len(), 2);
            assert_eq!(loaded.attributes.len(), 2);
        }

        it "does not duplicate an attribute patched in twice" {
            let plan = tms.test_plans.create(PROJECT, &TestPlanInput {
                name: Some("Release 2".to_string()),
                description: None,
                attributes: vec![AttributeInput::by_key("env", "prod")],
                milestone_ids: vec![],
            }).expect("Failed to create plan");

            tms.test_plans.patch(PROJECT, plan.id, &TestPlanInput {
                attributes: vec![AttributeInput::by_key("env", "prod")],
                ..Default::default()
            }).expect("Patch failed");

            let loaded = tms.test_plans.get_by_id(PROJECT, plan.id).unwrap();
            assert_eq!(loaded.attributes.len(), 1);
        }

        it "replaces milestones on update" {
            let m1 = tms.milestones.create(PROJECT, &MilestoneInput { name: "Beta".to_string() }).unwrap();
            let m2 = tms.milestones.create(PROJECT, &MilestoneInput { name: "GA".to_string() }).unwrap();
            let plan = tms.test_plans.create(PROJECT, &TestPlanInput {
                name: Some("Release".to_string()),
                milestone_ids: vec![m1.id],
                ..Default::default()
            }).unwrap();

            tms.test_plans.update(PROJECT, plan.id, &TestPlanInput {
                name: Some("Release".to_string()),
                milestone_ids: vec![m2.id],
                ..Default::default()
            }).expect("Update failed");

            let loaded = tms.test_plans.get_by_id(PROJECT, plan.id).unwrap();
            let ids: Vec<_> = loaded.milestones.iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![m2.id]);
        }

        it "deletes a plan but keeps its milestones" {
            let milestone = tms.milestones.create(PROJECT, &MilestoneInput { name: "GA".to_string() }).unwrap();
            let plan = tms.test_plans.create(PROJECT, &TestPlanInput {
                name: Some("Short".to_string()),
                attributes: vec![AttributeInput::by_key("team", "qa")],
                milestone_ids: vec![milestone.id],
                ..Default::default()
            }).unwrap();

            tms.transaction(|| tms.test_plans.delete(PROJECT, plan.id)).expect("Delete failed");

            assert!(tms.test_plans.get_by_id(PROJECT, plan.id).unwrap_err().is_not_found());
            assert!(tms.milestones.get_by_id(PROJECT, milestone.id).is_ok());
        }
    }

    describe "datasets" {
        it "binds environments and unions them on patch" {
            let staging = tms.datasets.create_environment(PROJECT, &EnvironmentInput { name: "staging".to_string() }).unwrap();
            let prod = tms.datasets.create_environment(PROJECT, &EnvironmentInput { name: "prod".to_string() }).unwrap();
            let mut row = DatasetRow::new();
            row.insert("username".to_string(), "alice".to_string());

            let dataset = tms.datasets.create(PROJECT, &DatasetInput {
                name: Some("Users".to_string()),
                rows: Some(vec![row]),
                environment_ids: vec![staging.id],
            }).expect("Failed to create dataset");
            tms.datasets.patch(PROJECT, dataset.id, &DatasetInput {
                environment_ids: vec![staging.id, prod.id],
                ..Default::default()
            }).expect("Patch failed");

            let loaded = tms.datasets.get_by_id(PROJECT, dataset.id).unwrap();
            assert_eq!(loaded.rows[0]["username"], "alice");
            let envs: Vec<_> = loaded.environments.iter().map(|l| l.environment_id).collect();
            assert_eq!(envs, vec![staging.id, prod.id]);
        }

        it "rejects environments of another project" {
            let foreign = tms.datasets.create_environment(2, &EnvironmentInput { name: "other".to_string() }).unwrap();

            let err = tms.transaction(|| tms.datasets.create(PROJECT, &DatasetInput {
                name: Some("Users".to_string()),
                rows: None,
                environment_ids: vec![foreign.id],
            })).unwrap_err();

            assert!(err.is_not_found());
        }

        it "deletes a dataset with its links" {
            let env = tms.datasets.create_environment(PROJECT, &EnvironmentInput { name: "qa".to_string() }).unwrap();
            let dataset = tms.datasets.create(PROJECT, &DatasetInput {
                name: Some("Cards".to_string()),
                rows: None,
                environment_ids: vec![env.id],
            }).unwrap();

            tms.datasets.delete(PROJECT, dataset.id).expect("Delete failed");

            assert!(tms.datasets.get_by_id(PROJECT, dataset.id).unwrap_err().is_not_found());
        }
    }
}
