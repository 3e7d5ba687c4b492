//! Generation orchestrator
//!
//! Resolves the template and settings sources, renders every configuration,
//! applies preferences and post-processing per file, and aggregates the
//! outcome. Per-configuration failures stay on that configuration's
//! [`GeneratedFile`]; only a missing or unloadable source aborts the run.

use tracing::{debug, warn};

use confweave_domain::{
    codes, GeneratedFile, GenerationIssue, GenerationResult, PreferenceError,
    PreferencesManager, SettingsLoadError, SettingsLoader, TemplateRenderResult, TokenDataset,
};
use confweave_settings::CsvSettingsLoader;
use confweave_templating::{XmlPrettyPrinter, XmlTemplate};

use crate::output_writer::OutputWriter;

/// Component name reported as the `source` of orchestration issues.
pub const GENERATOR_SOURCE: &str = "Generator";

/// Orchestrates settings loading, per-configuration rendering and output
/// writing into a single [`GenerationResult`].
pub struct Generator {
    preferences: PreferencesManager,
    loader: Box<dyn SettingsLoader>,
    writer: OutputWriter,
}

impl Generator {
    /// Create a generator over the default CSV settings loader.
    pub fn new(preferences: PreferencesManager) -> Self {
        Self {
            preferences,
            loader: Box::new(CsvSettingsLoader::new()),
            writer: OutputWriter::new(),
        }
    }

    /// Replace the settings loader.
    pub fn with_loader(mut self, loader: Box<dyn SettingsLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Run generation for every configuration in the settings source.
    ///
    /// The run always completes and returns a full result object; callers
    /// decide success or failure from the issue lists.
    pub fn generate(&self) -> GenerationResult {
        let preferences = self.preferences.preferences();

        if !preferences.template_file.exists() {
            return Self::aborted(GenerationIssue::new(
                codes::TEMPLATE_FILE_NOT_FOUND,
                GENERATOR_SOURCE,
                format!(
                    "template file not found: {}",
                    preferences.template_file.display()
                ),
            ));
        }

        let configurations = match self.loader.load(&preferences.settings_file) {
            Ok(configurations) => configurations,
            Err(SettingsLoadError::FileNotFound(path)) => {
                return Self::aborted(GenerationIssue::new(
                    codes::SETTINGS_FILE_NOT_FOUND,
                    GENERATOR_SOURCE,
                    format!("settings file not found: {}", path.display()),
                ));
            }
            Err(err) => {
                return Self::aborted(GenerationIssue::new(
                    codes::SETTINGS_LOAD_ERROR,
                    GENERATOR_SOURCE,
                    err.to_string(),
                ));
            }
        };

        let template = match XmlTemplate::from_file(&preferences.template_file) {
            Ok(template) => template,
            Err(err) => {
                return Self::aborted(GenerationIssue::new(
                    codes::TEMPLATE_LOAD_ERROR,
                    GENERATOR_SOURCE,
                    err.to_string(),
                ));
            }
        };

        debug!(configurations = configurations.len(), "generation started");

        let datasets: Vec<TokenDataset<'_>> =
            configurations.iter().map(TokenDataset::new).collect();
        let render_results = template.render_all(&datasets);

        let generated_files = datasets
            .iter()
            .zip(render_results)
            .map(|(dataset, render)| self.finish_configuration(dataset, render))
            .collect();

        GenerationResult {
            generated_files,
            issues: Vec::new(),
        }
    }

    fn aborted(issue: GenerationIssue) -> GenerationResult {
        warn!(%issue, "generation aborted");
        GenerationResult {
            generated_files: Vec::new(),
            issues: vec![issue],
        }
    }

    /// Turn one render result into its final [`GeneratedFile`] record.
    fn finish_configuration(
        &self,
        dataset: &TokenDataset<'_>,
        render: TemplateRenderResult,
    ) -> GeneratedFile {
        // template-requested preferences apply to this file only; the base
        // manager keeps caller pins intact across configurations
        let mut manager = self.preferences.clone();
        let mut preference_issues = Vec::new();
        for (name, value) in &render.template_preferences {
            match manager.apply_from_template(name, value) {
                Ok(()) => {}
                Err(err @ PreferenceError::Unrecognised(_)) => {
                    preference_issues.push(GenerationIssue::new(
                        codes::UNRECOGNISED_PREFERENCE,
                        GENERATOR_SOURCE,
                        err.to_string(),
                    ));
                }
                Err(err @ PreferenceError::InvalidValue { .. }) => {
                    preference_issues.push(GenerationIssue::new(
                        codes::INVALID_PREFERENCE_VALUE,
                        GENERATOR_SOURCE,
                        err.to_string(),
                    ));
                }
            }
        }
        let preferences = manager.preferences();

        let rendered = match render.rendered {
            Some(rendered) if render.errors.is_empty() && preference_issues.is_empty() => {
                rendered
            }
            _ => {
                let mut issues = render.errors;
                issues.extend(preference_issues);
                return GeneratedFile {
                    configuration_name: render.configuration_name,
                    full_path: None,
                    used_tokens: render.used_tokens,
                    unused_tokens: render.unused_tokens,
                    unrecognised_tokens: render.unrecognised_tokens,
                    issues,
                    has_changed: false,
                };
            }
        };

        let rendered = if preferences.xml_pretty_print {
            let printer = XmlPrettyPrinter::new(preferences.xml_pretty_print_tab_size);
            match printer.process(&rendered) {
                Ok(pretty) => pretty,
                Err(err) => {
                    return GeneratedFile {
                        configuration_name: render.configuration_name,
                        full_path: None,
                        used_tokens: render.used_tokens,
                        unused_tokens: render.unused_tokens,
                        unrecognised_tokens: render.unrecognised_tokens,
                        issues: vec![GenerationIssue::new(
                            codes::PRETTY_PRINT_ERROR,
                            "PrettyPrinter",
                            format!(
                                "post-processing failed for configuration '{}': {}",
                                dataset.name(),
                                err
                            ),
                        )],
                        has_changed: false,
                    };
                }
            }
        } else {
            rendered
        };

        let write = match self.writer.write(dataset, &rendered, preferences) {
            Ok(write) => write,
            Err(err) => {
                return GeneratedFile {
                    configuration_name: render.configuration_name,
                    full_path: None,
                    used_tokens: render.used_tokens,
                    unused_tokens: render.unused_tokens,
                    unrecognised_tokens: render.unrecognised_tokens,
                    issues: vec![GenerationIssue::new(
                        codes::OUTPUT_WRITE_ERROR,
                        crate::output_writer::WRITER_SOURCE,
                        err.to_string(),
                    )],
                    has_changed: false,
                };
            }
        };

        let mut used_tokens = render.used_tokens;
        let mut unused_tokens = render.unused_tokens;
        if let Some(token) = write.filename_token_used {
            unused_tokens.retain(|unused| unused != &token);
            if !used_tokens.contains(&token) {
                used_tokens.push(token);
                used_tokens.sort();
            }
        }

        let mut issues = render.warnings;
        for token in &unused_tokens {
            issues.push(GenerationIssue::new(
                codes::UNUSED_TOKEN,
                GENERATOR_SOURCE,
                format!(
                    "token '{}' was not used by configuration '{}'",
                    token,
                    dataset.name()
                ),
            ));
        }
        for token in &render.unrecognised_tokens {
            issues.push(GenerationIssue::new(
                codes::UNRECOGNISED_TOKEN,
                GENERATOR_SOURCE,
                format!(
                    "configuration '{}' does not define token '{}' referenced by the template",
                    dataset.name(),
                    token
                ),
            ));
        }

        debug!(
            configuration = dataset.name(),
            path = %write.full_path.display(),
            changed = write.has_changed,
            "configuration generated"
        );

        GeneratedFile {
            configuration_name: render.configuration_name,
            full_path: Some(write.full_path),
            used_tokens,
            unused_tokens,
            unrecognised_tokens: render.unrecognised_tokens,
            issues,
            has_changed: write.has_changed,
        }
    }
}
