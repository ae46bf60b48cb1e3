//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

use crate::export::FileType;

/// Configuration for the CLI and for opening the default database.
#[derive(Clone, Debug)]
pub struct TmsConfig {
    /// Database file (from TMS_DATABASE_PATH, defaults to the platform data dir)
    pub database_path: PathBuf,
    /// Export format used when none is given (from TMS_EXPORT_FORMAT)
    pub export_format: FileType,
}

impl TmsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_path = match std::env::var("TMS_DATABASE_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => Self::default_database_path()?,
        };

        let export_format = match std::env::var("TMS_EXPORT_FORMAT") {
            Ok(format) => FileType::from_str(&format)
                .ok_or_else(|| anyhow::anyhow!("Unsupported TMS_EXPORT_FORMAT: {}", format))?,
            Err(_) => FileType::Csv,
        };

        Ok(Self {
            database_path,
            export_format,
        })
    }

    pub fn default_database_path() -> anyhow::Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "tms")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("tms.db"))
    }
}
