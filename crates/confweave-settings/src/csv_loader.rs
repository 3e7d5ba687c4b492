//! CSV settings loader
//!
//! The first record is the header: setting names, with column one naming the
//! configuration-name column. Every following record is one configuration;
//! its first cell is the configuration name, the rest map header name to
//! value. An empty cell is an absent value. The name column doubles as an
//! ordinary setting, so templates can reference it like any other token.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use tracing::debug;

use confweave_domain::{Configuration, SettingsLoadError, SettingsLoader};

/// Settings loader for CSV files.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSettingsLoader;

impl CsvSettingsLoader {
    /// Create a new loader.
    pub fn new() -> Self {
        Self
    }
}

impl SettingsLoader for CsvSettingsLoader {
    fn loader_type(&self) -> &'static str {
        "csv"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &[".csv"]
    }

    fn load(&self, path: &Path) -> Result<Vec<Configuration>, SettingsLoadError> {
        if !path.exists() {
            return Err(SettingsLoadError::FileNotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        let mut records = reader.records();

        let header = match records.next() {
            Some(record) => record.map_err(|err| SettingsLoadError::Parse(err.to_string()))?,
            None => return Err(SettingsLoadError::EmptyFile(path.to_path_buf())),
        };
        let header: Vec<String> = header.iter().map(|cell| cell.trim().to_string()).collect();

        let mut seen_settings = HashSet::new();
        for name in &header {
            if !seen_settings.insert(name.as_str()) {
                return Err(SettingsLoadError::DuplicateSettingName(name.clone()));
            }
        }

        let mut configurations = Vec::new();
        let mut seen_names = HashSet::new();
        for (index, record) in records.enumerate() {
            let record = record.map_err(|err| SettingsLoadError::Parse(err.to_string()))?;
            let number = index + 2;

            if record.len() > header.len() {
                return Err(SettingsLoadError::MalformedRecord {
                    record: number,
                    path: path.to_path_buf(),
                    detail: format!(
                        "{} cells but only {} columns in the header",
                        record.len(),
                        header.len()
                    ),
                });
            }

            let name = record.get(0).unwrap_or("").trim().to_string();
            if name.is_empty() {
                return Err(SettingsLoadError::MalformedRecord {
                    record: number,
                    path: path.to_path_buf(),
                    detail: "missing configuration name".to_string(),
                });
            }
            if !seen_names.insert(name.clone()) {
                return Err(SettingsLoadError::DuplicateConfigurationName(name));
            }

            let mut settings = Vec::with_capacity(header.len());
            for (column, setting_name) in header.iter().enumerate() {
                let cell = record.get(column).unwrap_or("");
                let value = if cell.is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                };
                settings.push((setting_name.clone(), value));
            }
            configurations.push(Configuration::new(name, settings));
        }

        if configurations.is_empty() {
            return Err(SettingsLoadError::EmptyFile(path.to_path_buf()));
        }

        debug!(
            path = %path.display(),
            configurations = configurations.len(),
            "settings loaded"
        );
        Ok(configurations)
    }
}
