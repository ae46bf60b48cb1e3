//! Plain-text tree rendering of an exported folder.

use std::io::Write;

use super::Exporter;
use crate::error::Result;
use crate::models::TestFolderNode;

const FOLDER: char = '▸';
const TEST_CASE: char = '•';

/// Renders the tree with box-drawing branches.
///
/// Example output:
/// ```text
/// Regression
/// ├── • Smoke check
/// ├── ▸ Login
/// │   ├── • Valid password
/// │   └── • Locked account
/// └── ▸ Checkout
/// ```
pub struct TxtExporter;

impl Exporter for TxtExporter {
    fn export(&self, root: &TestFolderNode, sink: &mut dyn Write) -> Result<()> {
        sink.write_all(render_tree(root).as_bytes())?;
        sink.flush()?;
        Ok(())
    }
}

pub fn render_tree(root: &TestFolderNode) -> String {
    let mut output = String::new();
    output.push_str(&root.folder.name);
    output.push('\n');
    render_children(&mut output, root, "");
    output
}

enum Entry<'a> {
    TestCase(&'a str),
    Folder(&'a TestFolderNode),
}

/// Test cases come before subfolders.
fn render_children(output: &mut String, node: &TestFolderNode, prefix: &str) {
    let entries: Vec<Entry<'_>> = node
        .test_cases
        .iter()
        .map(|tc| Entry::TestCase(&tc.name))
        .chain(node.sub_test_folders.iter().map(Entry::Folder))
        .collect();

    for (i, entry) in entries.iter().enumerate() {
        let is_last = i == entries.len() - 1;
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);

        match entry {
            Entry::TestCase(name) => {
                output.push(TEST_CASE);
                output.push(' ');
                output.push_str(name);
                output.push('\n');
            }
            Entry::Folder(child) => {
                output.push(FOLDER);
                output.push(' ');
                output.push_str(&child.folder.name);
                output.push('\n');

                let continuation = if is_last { "    " } else { "│   " };
                render_children(output, child, &format!("{}{}", prefix, continuation));
            }
        }
    }
}
