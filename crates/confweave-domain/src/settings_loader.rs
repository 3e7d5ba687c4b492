//! Contract for settings sources

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::configuration::Configuration;

/// Failure to load configurations from a settings source.
#[derive(Debug, Error)]
pub enum SettingsLoadError {
    /// The settings file does not exist.
    #[error("settings file not found: {0}")]
    FileNotFound(PathBuf),
    /// The settings file contains no configurations.
    #[error("settings file contains no configurations: {0}")]
    EmptyFile(PathBuf),
    /// Two configurations share a name.
    #[error("duplicate configuration name: {0}")]
    DuplicateConfigurationName(String),
    /// Two columns share a setting name.
    #[error("duplicate setting name: {0}")]
    DuplicateSettingName(String),
    /// A record did not match the header shape.
    #[error("malformed record {record} in {path}: {detail}")]
    MalformedRecord {
        /// 1-based record number, counting the header.
        record: usize,
        /// Source path.
        path: PathBuf,
        /// What was wrong with the record.
        detail: String,
    },
    /// The source could not be parsed.
    #[error("failed to parse settings source: {0}")]
    Parse(String),
    /// Underlying IO failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A source of ordered configurations.
///
/// Loaders fail with a typed error rather than panicking; the orchestrator
/// maps [`SettingsLoadError::FileNotFound`] to the run-fatal
/// `SettingsFileNotFound` issue and any other failure to `SettingsLoadError`.
pub trait SettingsLoader {
    /// Short identifier for this loader kind (e.g. `"csv"`).
    fn loader_type(&self) -> &'static str;

    /// File extensions this loader understands.
    fn supported_extensions(&self) -> &'static [&'static str];

    /// Load every configuration from `path`, in source order.
    fn load(&self, path: &Path) -> Result<Vec<Configuration>, SettingsLoadError>;
}
