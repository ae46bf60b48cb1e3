//! Serializers for exported folder trees.

mod csv;
mod txt;

pub use self::csv::CsvExporter;
pub use self::txt::{render_tree, TxtExporter};

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::TestFolderNode;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Txt,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    /// Case-insensitive parse of a format name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }
}

/// Writes a folder tree, with the test cases attached to each folder.
pub trait Exporter {
    fn export(&self, root: &TestFolderNode, sink: &mut dyn Write) -> Result<()>;
}

pub fn exporter_for(file_type: FileType) -> Box<dyn Exporter> {
    match file_type {
        FileType::Csv => Box::new(CsvExporter),
        FileType::Txt => Box::new(TxtExporter),
    }
}
