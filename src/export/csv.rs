use std::io::Write;

use serde::Serialize;

use super::Exporter;
use crate::error::Result;
use crate::models::{ScenarioVariant, Step, TestCase, TestFolderNode};

/// One row per test case. Folders without test cases get a single row with
/// empty test case columns, so every folder of the tree appears.
pub struct CsvExporter;

#[derive(Serialize)]
struct Record<'a> {
    folder_id: i64,
    folder_path: &'a str,
    folder_description: &'a str,
    test_case_id: Option<i64>,
    test_case_name: &'a str,
    test_case_description: &'a str,
    tags: String,
    scenario_type: &'a str,
    instructions: String,
    expected_result: String,
}

impl Exporter for CsvExporter {
    fn export(&self, root: &TestFolderNode, sink: &mut dyn Write) -> Result<()> {
        let mut writer = csv::Writer::from_writer(sink);
        write_folder(&mut writer, root, &root.folder.name)?;
        writer.flush()?;
        Ok(())
    }
}

fn write_folder<W: Write>(
    writer: &mut csv::Writer<W>,
    node: &TestFolderNode,
    path: &str,
) -> Result<()> {
    let folder_description = node.folder.description.as_deref().unwrap_or_default();

    if node.test_cases.is_empty() {
        writer.serialize(Record {
            folder_id: node.folder.id,
            folder_path: path,
            folder_description,
            test_case_id: None,
            test_case_name: "",
            test_case_description: "",
            tags: String::new(),
            scenario_type: "",
            instructions: String::new(),
            expected_result: String::new(),
        })?;
    }

    for test_case in &node.test_cases {
        let (scenario_type, instructions, expected_result) = scenario_columns(test_case);
        writer.serialize(Record {
            folder_id: node.folder.id,
            folder_path: path,
            folder_description,
            test_case_id: Some(test_case.id),
            test_case_name: &test_case.name,
            test_case_description: test_case.description.as_deref().unwrap_or_default(),
            tags: test_case
                .tags
                .iter()
                .map(|tag| match &tag.value {
                    Some(value) => format!("{}:{}", tag.key, value),
                    None => tag.key.clone(),
                })
                .collect::<Vec<_>>()
                .join(";"),
            scenario_type,
            instructions,
            expected_result,
        })?;
    }

    for child in &node.sub_test_folders {
        let child_path = format!("{}/{}", path, child.folder.name);
        write_folder(writer, child, &child_path)?;
    }
    Ok(())
}

/// Type, instructions and expected result of the default version's scenario.
/// Steps are numbered and joined by newlines.
fn scenario_columns(test_case: &TestCase) -> (&'static str, String, String) {
    let Some(scenario) = test_case
        .default_version
        .as_ref()
        .and_then(|v| v.manual_scenario.as_ref())
    else {
        return ("", String::new(), String::new());
    };

    match &scenario.variant {
        Some(ScenarioVariant::Text(text)) => (
            scenario.scenario_type.as_str(),
            text.instructions.clone().unwrap_or_default(),
            text.expected_result.clone().unwrap_or_default(),
        ),
        Some(ScenarioVariant::Steps(body)) => (
            scenario.scenario_type.as_str(),
            numbered(&body.steps, |s| s.instructions.as_deref()),
            numbered(&body.steps, |s| s.expected_result.as_deref()),
        ),
        None => (scenario.scenario_type.as_str(), String::new(), String::new()),
    }
}

fn numbered<F>(steps: &[Step], field: F) -> String
where
    F: Fn(&Step) -> Option<&str>,
{
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, field(step).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}
