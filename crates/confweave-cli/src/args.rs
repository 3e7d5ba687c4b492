//! Command-line arguments
//!
//! Every flag maps onto a named preference in the registry; flags the user
//! actually passed are pinned, so a template directive can never override an
//! explicit command-line choice.

use std::path::PathBuf;

use clap::Parser;

use confweave_domain::{PreferenceError, PreferencesManager};

/// Generate per-configuration files from a template and a settings source.
#[derive(Debug, Parser)]
#[command(name = "confweave", version, about)]
pub struct CliArgs {
    /// Path to the settings file.
    #[arg(long, short = 's')]
    pub settings_file: Option<PathBuf>,

    /// Path to the template file.
    #[arg(long, short = 't')]
    pub template_file: Option<PathBuf>,

    /// Root directory for generated output.
    #[arg(long, short = 'o')]
    pub output_directory: Option<PathBuf>,

    /// Fixed output filename for every configuration.
    #[arg(long)]
    pub forced_filename: Option<String>,

    /// Token whose value names each configuration's output file.
    #[arg(long)]
    pub filename_setting: Option<String>,

    /// Report changes without writing any files.
    #[arg(long)]
    pub inhibit_write: bool,

    /// Pretty-print rendered XML before writing.
    #[arg(long, value_name = "BOOL")]
    pub pretty_print: Option<bool>,

    /// Indent width for pretty-printing.
    #[arg(long, value_name = "SPACES")]
    pub tab_size: Option<usize>,

    /// Emit the full generation result as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl CliArgs {
    /// Convert parsed flags into a preferences manager, pinning every
    /// explicitly supplied name against template overrides.
    pub fn to_preferences(&self) -> Result<PreferencesManager, PreferenceError> {
        let mut pairs: Vec<(&'static str, String)> = Vec::new();
        if let Some(path) = &self.settings_file {
            pairs.push(("SettingsFilePath", path.display().to_string()));
        }
        if let Some(path) = &self.template_file {
            pairs.push(("TemplateFilePath", path.display().to_string()));
        }
        if let Some(path) = &self.output_directory {
            pairs.push(("OutputDirectory", path.display().to_string()));
        }
        if let Some(filename) = &self.forced_filename {
            pairs.push(("ForcedFilename", filename.clone()));
        }
        if let Some(setting) = &self.filename_setting {
            pairs.push(("FilenameSetting", setting.clone()));
        }
        if self.inhibit_write {
            pairs.push(("InhibitWrite", "true".to_string()));
        }
        if let Some(enabled) = self.pretty_print {
            pairs.push(("XmlPrettyPrint", enabled.to_string()));
        }
        if let Some(size) = self.tab_size {
            pairs.push(("XmlPrettyPrintTabSize", size.to_string()));
        }

        let mut manager = PreferencesManager::new();
        for (name, value) in &pairs {
            manager.set_from_caller(name, value)?;
        }
        Ok(manager)
    }
}
