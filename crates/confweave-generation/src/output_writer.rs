//! Change-aware output writer
//!
//! Writes rendered output only when the bytes differ from the existing file,
//! so repeated generation over unchanged inputs leaves the filesystem alone:
//! no spurious mtime churn, nothing for a VCS to pick up.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use confweave_domain::{Preferences, TokenDataset};

/// Component name reported as the `source` of writer issues.
pub const WRITER_SOURCE: &str = "OutputWriter";

/// Failure while writing an output file.
#[derive(Debug, Error)]
pub enum OutputWriteError {
    /// The target file or its directories could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target path.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
}

/// Result of one write operation.
#[derive(Debug, Clone)]
pub struct WriteOutputResult {
    /// Fully resolved output path.
    pub full_path: PathBuf,
    /// True when new content differs from any pre-existing file; a missing
    /// file counts as changed.
    pub has_changed: bool,
    /// True when bytes were written to disk. Mirrors `has_changed` under
    /// normal operation and is always false under inhibited writes.
    pub was_written: bool,
    /// The filename-setting token, when its value named the file.
    pub filename_token_used: Option<String>,
}

/// Writes one rendered document per configuration, only on change.
///
/// Filename resolution: an explicit `ForcedFilename` wins, else the value of
/// the `FilenameSetting` token, else `<ConfigurationName>.xml`. The final
/// path nests each configuration in its own subfolder, so writes for
/// different configurations never contend.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputWriter;

impl OutputWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self
    }

    /// Resolve the target path for `dataset` and write `rendered` if it
    /// differs from what is already on disk.
    pub fn write(
        &self,
        dataset: &TokenDataset<'_>,
        rendered: &str,
        preferences: &Preferences,
    ) -> Result<WriteOutputResult, OutputWriteError> {
        let mut filename_token_used = None;
        let mut filename = preferences.forced_filename.clone();
        if filename.is_none() {
            if let Some(setting) = &preferences.filename_setting {
                if let Some(Some(value)) = dataset.try_get(setting) {
                    filename = Some(value.to_string());
                    filename_token_used = Some(setting.clone());
                }
            }
        }
        let filename = filename.unwrap_or_else(|| format!("{}.xml", dataset.name()));

        let mut full_path = PathBuf::new();
        if let Some(directory) = &preferences.output_directory {
            full_path.push(directory);
        }
        full_path.push(dataset.name());
        full_path.push(&filename);

        let new_bytes = rendered.as_bytes();
        let has_changed = match fs::read(&full_path) {
            Ok(existing) => existing != new_bytes,
            Err(_) => true,
        };

        let mut was_written = false;
        if has_changed && !preferences.inhibit_write {
            self.write_bytes(&full_path, new_bytes)?;
            was_written = true;
        }

        debug!(
            path = %full_path.display(),
            has_changed,
            was_written,
            "output resolved"
        );

        Ok(WriteOutputResult {
            full_path,
            has_changed,
            was_written,
            filename_token_used,
        })
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<(), OutputWriteError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| OutputWriteError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, bytes).map_err(|source| OutputWriteError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
